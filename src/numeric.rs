//! Parsers for human-formatted numbers found on store pages.

use once_cell::sync::Lazy;
use regex::Regex;

// Tried in order; the first pattern that matches decides the rating.
static RATING_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*out\s+of\s+5").unwrap(),
        Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*-?\s*stars?").unwrap(),
        Regex::new(r"(?i)rated\s+(\d+(?:[.,]\d+)?)").unwrap(),
    ]
});

/// Parse an install count such as `"1,000,000+"`, `"10M"` or `"500K+ downloads"`.
///
/// Everything except digits, `.` and the magnitude letters `K`, `M`, `B`
/// is discarded first. Returns `None` when nothing numeric is left.
pub fn parse_installs<'a>(raw: impl Into<Option<&'a str>>) -> Option<u64> {
    let raw = raw.into()?;

    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || matches!(c, 'k' | 'K' | 'm' | 'M' | 'b' | 'B'))
        .collect::<String>()
        .to_uppercase();

    if cleaned.is_empty() {
        return None;
    }

    let multiplier = if cleaned.contains('B') {
        1_000_000_000.0
    } else if cleaned.contains('M') {
        1_000_000.0
    } else if cleaned.contains('K') {
        1_000.0
    } else {
        return cleaned.parse::<u64>().ok();
    };

    let value = leading_float(&cleaned)? * multiplier;
    if value.is_finite() && value >= 0.0 {
        Some(value.round() as u64)
    } else {
        None
    }
}

/// Parse the leading `[0-9.]` run of `s` as a float.
fn leading_float(s: &str) -> Option<f64> {
    let end = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    s[..end].parse::<f64>().ok()
}

/// Pull a 0–5 star rating out of an accessible label like `"Rated 4.5 out of 5 stars"`.
///
/// A label that states zero yields `Some(0.0)`; only a label with no
/// recognizable rating yields `None`.
pub fn parse_rating(label: &str) -> Option<f64> {
    let captured = RATING_PATTERNS
        .iter()
        .find_map(|re| re.captures(label))
        .and_then(|caps| caps.get(1))?;

    let value: f64 = captured.as_str().replace(',', ".").parse().ok()?;
    (0.0..=5.0).contains(&value).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installs_reference_values() {
        assert_eq!(parse_installs("1,000+"), Some(1_000));
        assert_eq!(parse_installs("10M"), Some(10_000_000));
        assert_eq!(parse_installs("500K"), Some(500_000));
        assert_eq!(parse_installs(""), None);
        assert_eq!(parse_installs(None), None);
    }

    #[test]
    fn installs_with_fraction_and_words() {
        assert_eq!(parse_installs("1.2M+"), Some(1_200_000));
        assert_eq!(parse_installs("10k downloads"), Some(10_000));
        assert_eq!(parse_installs("5,000,000+ installs"), Some(5_000_000));
        assert_eq!(parse_installs("1B+"), Some(1_000_000_000));
    }

    #[test]
    fn installs_without_digits_is_none() {
        assert_eq!(parse_installs("downloads"), None);
        assert_eq!(parse_installs("+"), None);
        assert_eq!(parse_installs("M"), None);
    }

    #[test]
    fn installs_plain_decimal_is_not_an_integer() {
        assert_eq!(parse_installs("1.5"), None);
    }

    #[test]
    fn rating_prefers_out_of_five() {
        assert_eq!(parse_rating("Rated 4.5 out of 5 stars"), Some(4.5));
        assert_eq!(parse_rating("3.9 out of 5"), Some(3.9));
    }

    #[test]
    fn rating_falls_back_to_star_then_rated() {
        assert_eq!(parse_rating("4.1 star"), Some(4.1));
        assert_eq!(parse_rating("Average 3 stars"), Some(3.0));
        assert_eq!(parse_rating("Rated 2.7"), Some(2.7));
    }

    #[test]
    fn rating_zero_is_kept() {
        assert_eq!(parse_rating("Rated 0 out of 5 stars"), Some(0.0));
        assert_eq!(parse_rating("Rated 0.0"), Some(0.0));
    }

    #[test]
    fn rating_missing_or_out_of_range_is_none() {
        assert_eq!(parse_rating("No reviews yet"), None);
        assert_eq!(parse_rating(""), None);
        assert_eq!(parse_rating("Rated 12 out of 5"), None);
    }

    #[test]
    fn rating_accepts_decimal_comma() {
        assert_eq!(parse_rating("4,3 out of 5"), Some(4.3));
    }
}
