//! Normalizing autocomplete responses.
//!
//! The suggest endpoint answers with `["query", ["s1", "s2", ...], ...]`.
//! Some responses arrive wrapped (JSONP, XSSI prefixes) or truncated, in
//! which case the suggestion array is pulled out with a regex instead.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::text::normalize_text;

static SUGGESTION_ARRAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\[\s*"(?:[^"\\]|\\.)*"\s*,\s*\[((?:[^\[\]"]|"(?:[^"\\]|\\.)*")*)\]"#).unwrap());
static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#""((?:[^"\\]|\\.)*)""#).unwrap());

/// Turn a raw suggest response into a clean, de-duplicated list of suggestions.
///
/// Malformed input never errors; it yields an empty list.
pub fn parse_suggestions(raw: &str) -> Vec<String> {
    let strings = from_json(raw).unwrap_or_else(|| {
        tracing::debug!("suggest response is not plain JSON, trying regex extraction");
        from_text(raw).unwrap_or_default()
    });

    let mut seen = HashSet::new();
    strings
        .into_iter()
        .map(|s| normalize_text(s.as_str()))
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

fn from_json(raw: &str) -> Option<Vec<String>> {
    let value: Value = serde_json::from_str(raw.trim()).ok()?;
    let items = value.as_array()?.get(1)?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                // Some clients nest each suggestion as ["text", score, ...]
                Value::Array(inner) => inner.first()?.as_str().map(str::to_string),
                _ => None,
            })
            .collect(),
    )
}

fn from_text(raw: &str) -> Option<Vec<String>> {
    let inner = SUGGESTION_ARRAY.captures(raw)?.get(1)?.as_str();
    Some(
        QUOTED
            .captures_iter(inner)
            .map(|caps| unescape(&caps[1]))
            .collect(),
    )
}

fn unescape(s: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{s}\"")).unwrap_or_else(|_| s.to_string())
}
