//! Detail-page extraction.
//!
//! Every field of a [`CompetitorRecord`] is resolved by its own
//! [`FieldChain`]: an ordered list of pure strategies, each a function from
//! a parsed page to an optional string. The first strategy that produces a
//! non-empty (normalized) value wins. Store markup changes often, so the
//! chains are the only place that knows about selectors.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::numeric::{parse_installs, parse_rating};
use crate::text::normalize_text;

static PRIMARY_HEADING_SPAN: Lazy<Selector> = Lazy::new(|| Selector::parse("h1 span").unwrap());
static TOP_HEADING: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static DESCRIPTION_FIELD: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"[data-g-id="description"], div[itemprop="description"]"#).unwrap()
});
static META_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="description"]"#).unwrap());
static RATING_LABEL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"[aria-label*="Rated"], [aria-label*="rated"], [aria-label*="star"], [aria-label*="Star"]"#)
        .unwrap()
});
static DOWNLOADS_META: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[itemprop="numDownloads"]"#).unwrap());
static DEVELOPER_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[href*="/store/apps/dev"]"#).unwrap());
static JSON_LD: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());

static INSTALLS_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\d[\d,.]*\s*[KMB]?\+?(?:\s*(?:downloads|installs))?").unwrap()
});

/// Separator used when joining the candidate installs texts.
pub const INSTALLS_DELIMITER: &str = " | ";

// Containers longer than this are page sections, not install badges.
const MAX_BADGE_TEXT_LEN: usize = 80;

/// Normalized metadata for one competitor app.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CompetitorRecord {
    pub package_id: String,
    pub title: String,
    pub description: String,
    pub installs: Option<u64>,
    pub rating: Option<f64>,
    pub developer: Option<String>,
}

impl CompetitorRecord {
    /// Record used when a candidate's detail page could not be fetched at all.
    pub fn degraded(package_id: &str) -> Self {
        Self {
            package_id: package_id.to_string(),
            title: package_id.to_string(),
            description: String::new(),
            installs: None,
            rating: None,
            developer: None,
        }
    }
}

/// Raw detail-page content as delivered by the store collaborator.
#[derive(Debug, Clone, Default)]
pub struct DetailPage {
    /// Rendered markup of the page.
    pub html: String,
    /// Installs text the browser located in the live DOM, if any.
    pub installs_hint: Option<String>,
}

impl DetailPage {
    pub fn from_html(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            installs_hint: None,
        }
    }
}

/// A detail page parsed once and shared by every strategy.
pub struct DetailDocument {
    document: Html,
    json_ld: Vec<Value>,
    installs_hint: Option<String>,
}

impl DetailDocument {
    pub fn parse(page: &DetailPage) -> Self {
        let document = Html::parse_document(&page.html);
        let json_ld = extract_json_ld(&document);
        Self {
            document,
            json_ld,
            installs_hint: page.installs_hint.clone(),
        }
    }

    pub fn html(&self) -> &Html {
        &self.document
    }

    pub fn json_ld(&self) -> &[Value] {
        &self.json_ld
    }

    fn first_text(&self, selector: &Selector) -> Option<String> {
        self.document
            .select(selector)
            .map(|el| normalize_text(el.text().collect::<String>().as_str()))
            .find(|text| !text.is_empty())
    }

    fn first_attr(&self, selector: &Selector, attr: &str) -> Option<String> {
        self.document
            .select(selector)
            .filter_map(|el| el.value().attr(attr))
            .map(|raw| normalize_text(raw))
            .find(|text| !text.is_empty())
    }

    /// First value found at `path` across all JSON-LD blocks.
    fn json_ld_field(&self, path: &[&str]) -> Option<String> {
        self.json_ld.iter().find_map(|block| {
            let value = path.iter().try_fold(block, |node, key| node.get(*key))?;
            json_scalar(value)
        })
    }
}

/// Parse every JSON-LD block on the page, flattening top-level arrays and `@graph`s.
fn extract_json_ld(document: &Html) -> Vec<Value> {
    let mut blocks = Vec::new();
    for script in document.select(&JSON_LD) {
        let raw = script.text().collect::<String>();
        let Ok(value) = serde_json::from_str::<Value>(&raw) else {
            continue;
        };
        match value {
            Value::Array(items) => blocks.extend(items),
            Value::Object(ref obj) if obj.get("@graph").is_some_and(Value::is_array) => {
                if let Some(Value::Array(items)) = obj.get("@graph") {
                    blocks.extend(items.iter().cloned());
                }
            }
            other => blocks.push(other),
        }
    }
    blocks
}

fn json_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A single extraction strategy.
pub type Strategy = fn(&DetailDocument) -> Option<String>;

/// Ordered fallback chain for one field.
pub struct FieldChain {
    field: &'static str,
    strategies: Vec<Strategy>,
}

impl FieldChain {
    pub fn new(field: &'static str, strategies: Vec<Strategy>) -> Self {
        Self { field, strategies }
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    /// Value of the first strategy that yields non-empty normalized text.
    pub fn resolve(&self, doc: &DetailDocument) -> Option<String> {
        self.strategies.iter().enumerate().find_map(|(idx, strategy)| {
            let value = strategy(doc)
                .map(|raw| normalize_text(raw.as_str()))
                .filter(|v| !v.is_empty())?;
            tracing::trace!(field = self.field, strategy = idx, "field resolved");
            Some(value)
        })
    }

    /// Every non-empty value, in strategy order.
    pub fn collect_all(&self, doc: &DetailDocument) -> Vec<String> {
        self.strategies
            .iter()
            .filter_map(|strategy| strategy(doc))
            .map(|raw| normalize_text(raw.as_str()))
            .filter(|v| !v.is_empty())
            .collect()
    }
}

// ============================================================================
// Strategies
// ============================================================================

pub fn heading_span(doc: &DetailDocument) -> Option<String> {
    doc.first_text(&PRIMARY_HEADING_SPAN)
}

pub fn top_heading(doc: &DetailDocument) -> Option<String> {
    doc.first_text(&TOP_HEADING)
}

pub fn json_ld_name(doc: &DetailDocument) -> Option<String> {
    doc.json_ld_field(&["name"])
}

pub fn description_field(doc: &DetailDocument) -> Option<String> {
    doc.first_text(&DESCRIPTION_FIELD)
}

pub fn meta_description(doc: &DetailDocument) -> Option<String> {
    doc.first_attr(&META_DESCRIPTION, "content")
}

pub fn json_ld_description(doc: &DetailDocument) -> Option<String> {
    doc.json_ld_field(&["description"])
}

pub fn aria_rating_label(doc: &DetailDocument) -> Option<String> {
    doc.first_attr(&RATING_LABEL, "aria-label")
}

pub fn json_ld_rating_label(doc: &DetailDocument) -> Option<String> {
    doc.json_ld_field(&["aggregateRating", "ratingValue"])
        .map(|value| format!("Rated {value} out of 5"))
}

pub fn downloads_meta(doc: &DetailDocument) -> Option<String> {
    let meta = doc.first_attr(&DOWNLOADS_META, "content");
    let statistic = doc.json_ld.iter().find_map(|block| {
        let stat = block.get("interactionStatistic")?;
        let stat = match stat {
            Value::Array(items) => items.first()?,
            other => other,
        };
        json_scalar(stat.get("userInteractionCount")?)
    });
    match (meta, statistic) {
        (Some(a), Some(b)) => Some(format!("{a}{INSTALLS_DELIMITER}{b}")),
        (a, b) => a.or(b),
    }
}

/// Text nodes mentioning downloads or installs.
///
/// A bare label like "Downloads" usually sits next to its number in a
/// sibling element, so for digit-free labels the enclosing container's
/// text is taken instead, as long as it is badge-sized.
pub fn install_text_nodes(doc: &DetailDocument) -> Option<String> {
    let mut hits = Vec::new();

    for node in doc.document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let parent = node.parent().and_then(ElementRef::wrap);
        if parent.is_some_and(|p| matches!(p.value().name(), "script" | "style")) {
            continue;
        }

        let lower = text.to_lowercase();
        if !(lower.contains("download") || lower.contains("install")) {
            continue;
        }

        if text.chars().any(|c| c.is_ascii_digit()) {
            hits.push(text.to_string());
            continue;
        }

        let container = parent
            .and_then(|p| p.parent())
            .and_then(ElementRef::wrap)
            .map(|c| c.text().collect::<Vec<_>>().join(" "));
        if let Some(container) = container {
            if container.len() <= MAX_BADGE_TEXT_LEN {
                hits.push(container);
            }
        }
    }

    (!hits.is_empty()).then(|| hits.join(INSTALLS_DELIMITER))
}

pub fn dom_installs_hint(doc: &DetailDocument) -> Option<String> {
    doc.installs_hint.clone()
}

pub fn developer_link(doc: &DetailDocument) -> Option<String> {
    doc.first_text(&DEVELOPER_LINK)
}

/// First install-count-looking substring in the joined installs sources.
pub fn select_installs_text(joined: &str) -> Option<&str> {
    INSTALLS_FIELD.find(joined).map(|m| m.as_str())
}

/// Field chains for one store's detail pages.
pub struct DetailExtractor {
    title: FieldChain,
    description: FieldChain,
    rating_label: FieldChain,
    installs_sources: FieldChain,
    developer: FieldChain,
}

impl Default for DetailExtractor {
    fn default() -> Self {
        Self {
            title: FieldChain::new("title", vec![heading_span, top_heading, json_ld_name]),
            description: FieldChain::new(
                "description",
                vec![description_field, meta_description, json_ld_description],
            ),
            rating_label: FieldChain::new("rating", vec![aria_rating_label, json_ld_rating_label]),
            installs_sources: FieldChain::new(
                "installs",
                vec![downloads_meta, install_text_nodes, dom_installs_hint],
            ),
            developer: FieldChain::new("developer", vec![developer_link]),
        }
    }
}

impl DetailExtractor {
    pub fn new(
        title: FieldChain,
        description: FieldChain,
        rating_label: FieldChain,
        installs_sources: FieldChain,
        developer: FieldChain,
    ) -> Self {
        Self {
            title,
            description,
            rating_label,
            installs_sources,
            developer,
        }
    }

    /// Build a record for `package_id`; each field degrades on its own.
    pub fn extract(&self, package_id: &str, page: &DetailPage) -> CompetitorRecord {
        let doc = DetailDocument::parse(page);

        let title = self
            .title
            .resolve(&doc)
            .unwrap_or_else(|| package_id.to_string());
        let description = self.description.resolve(&doc).unwrap_or_default();

        let rating = self
            .rating_label
            .resolve(&doc)
            .and_then(|label| parse_rating(&label));

        let joined = self.installs_sources.collect_all(&doc).join(INSTALLS_DELIMITER);
        let installs = select_installs_text(&joined).and_then(|text| parse_installs(text));

        let developer = self.developer.resolve(&doc);

        tracing::debug!(
            package_id,
            title = %title,
            installs = ?installs,
            rating = ?rating,
            "detail extracted"
        );

        CompetitorRecord {
            package_id: package_id.to_string(),
            title,
            description,
            installs,
            rating,
            developer,
        }
    }
}
