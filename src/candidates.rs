//! Candidate discovery: package identifiers referenced by a search-results page.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

// `id` may sit anywhere in the query, so match on the path and let
// `package_id_from_href` find it.
static DETAIL_LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[href*="details?"]"#).unwrap());

// Raw-text fallback: catches ids in inline JSON, escaped URLs and data attributes.
static DETAIL_QUERY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"details\?([^"'\s<>\\]+)"#).unwrap());

static PACKAGE_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+(?:\.[A-Za-z0-9_]+)*").unwrap());

/// Order-preserving set of package ids, bounded by `limit`.
struct CandidateSet {
    limit: usize,
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl CandidateSet {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            seen: HashSet::new(),
            ordered: Vec::new(),
        }
    }

    fn is_full(&self) -> bool {
        self.ordered.len() >= self.limit
    }

    fn push(&mut self, id: &str) {
        if self.is_full() || id.is_empty() {
            return;
        }
        if self.seen.insert(id.to_string()) {
            self.ordered.push(id.to_string());
        }
    }
}

/// Read the `id` query parameter out of a detail-page href.
pub fn package_id_from_href(href: &str) -> Option<String> {
    id_from_query(href.split_once('?')?.1)
}

fn id_from_query(query: &str) -> Option<String> {
    let query = query.split('#').next().unwrap_or(query);

    query
        .split('&')
        .map(|pair| pair.strip_prefix("amp;").unwrap_or(pair))
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "id")
        .map(|(_, value)| {
            urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string())
        })
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
}

/// Collect up to `limit` unique package ids from search-results markup.
///
/// Anchors linking to a detail page are scanned first. If they yield fewer
/// than `limit` ids, a regex pass over the raw markup fills the remaining
/// slots. Ids keep the order in which they were first seen across both passes.
pub fn extract_candidates(html: &str, limit: usize) -> Vec<String> {
    let mut set = CandidateSet::new(limit);
    if html.trim().is_empty() || limit == 0 {
        return set.ordered;
    }

    let document = Html::parse_document(html);
    for anchor in document.select(&DETAIL_LINK_SELECTOR) {
        if set.is_full() {
            break;
        }
        if let Some(id) = anchor.value().attr("href").and_then(package_id_from_href) {
            set.push(&id);
        }
    }
    let structured = set.ordered.len();

    if !set.is_full() {
        for caps in DETAIL_QUERY_REGEX.captures_iter(html) {
            if set.is_full() {
                break;
            }
            // Decoded the same way as anchor hrefs, then cut to the id shape so
            // trailing punctuation from scripts or prose is dropped.
            let id = id_from_query(&caps[1]).and_then(|id| {
                PACKAGE_ID_REGEX
                    .find(&id)
                    .map(|m| m.as_str().to_string())
            });
            if let Some(id) = id {
                set.push(&id);
            }
        }
    }

    tracing::debug!(
        structured,
        total = set.ordered.len(),
        limit,
        "candidate extraction finished"
    );
    set.ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(id: &str) -> String {
        format!(r#"<a href="/store/apps/details?id={id}&hl=en">{id}</a>"#)
    }

    #[test]
    fn empty_markup_is_empty() {
        assert!(extract_candidates("", 10).is_empty());
        assert!(extract_candidates("   ", 10).is_empty());
    }

    #[test]
    fn duplicate_links_collapse_in_first_seen_order() {
        let html = format!(
            "<html><body>{}{}{}{}</body></html>",
            link("com.alpha.notes"),
            link("com.alpha.notes"),
            link("com.beta.todo"),
            link("com.alpha.notes"),
        );
        assert_eq!(
            extract_candidates(&html, 10),
            vec!["com.alpha.notes".to_string(), "com.beta.todo".to_string()]
        );
    }

    #[test]
    fn regex_fallback_fills_remaining_slots() {
        let html = format!(
            r#"<body>{}<script>var data = "/store/apps/details?id=com.gamma.timer";</script>
               <div data-href="details?id=com.delta.clock"></div></body>"#,
            link("com.beta.todo")
        );
        assert_eq!(
            extract_candidates(&html, 5),
            vec![
                "com.beta.todo".to_string(),
                "com.gamma.timer".to_string(),
                "com.delta.clock".to_string(),
            ]
        );
    }

    #[test]
    fn never_exceeds_limit_or_duplicates() {
        let body: String = (0..80)
            .map(|i| link(&format!("com.example.app{}", i % 60)))
            .collect();
        let html = format!("<body>{body}</body>");

        for limit in 1..=50 {
            let ids = extract_candidates(&html, limit);
            assert!(ids.len() <= limit);
            let unique: HashSet<_> = ids.iter().collect();
            assert_eq!(unique.len(), ids.len(), "duplicate at limit {limit}");
        }
    }

    #[test]
    fn stops_at_limit_across_passes() {
        let html = format!(
            "<body>{}{}<p>details?id=com.c.c details?id=com.d.d</p></body>",
            link("com.a.a"),
            link("com.b.b")
        );
        assert_eq!(
            extract_candidates(&html, 3),
            vec!["com.a.a".to_string(), "com.b.b".to_string(), "com.c.c".to_string()]
        );
    }

    #[test]
    fn encoded_id_is_not_duplicated_by_fallback() {
        let html = r#"<a href="/store/apps/details?id=com.x%2Ey">X</a>"#;
        assert_eq!(extract_candidates(html, 5), vec!["com.x.y".to_string()]);
    }

    #[test]
    fn id_after_other_query_params_is_found() {
        let html = r#"<a href="/store/apps/details?hl=en&id=com.real.app">Real</a>"#;
        assert_eq!(extract_candidates(html, 5), vec!["com.real.app".to_string()]);

        let script = r#"<script>go("/store/apps/details?hl=en&amp;gl=us&amp;id=com.other.app")</script>"#;
        assert_eq!(extract_candidates(script, 5), vec!["com.other.app".to_string()]);
    }

    #[test]
    fn detail_links_without_id_are_skipped() {
        let html = format!(
            r#"<a href="/store/apps/details?hl=en">none</a>{}"#,
            link("com.beta.todo")
        );
        assert_eq!(extract_candidates(&html, 5), vec!["com.beta.todo".to_string()]);
    }

    #[test]
    fn href_parsing_handles_encoded_and_missing_ids() {
        assert_eq!(
            package_id_from_href("https://play.google.com/store/apps/details?hl=en&id=com.x%2Ey"),
            Some("com.x.y".to_string())
        );
        assert_eq!(package_id_from_href("/store/apps/details?hl=en"), None);
        assert_eq!(package_id_from_href("/store/apps/details?id="), None);
        assert_eq!(package_id_from_href("/store/apps"), None);
    }
}
