//! Text normalization for strings pulled out of scraped markup.
//!
//! Store pages are full of layout noise: non-breaking spaces, zero-width
//! joiners, soft hyphens and byte-order marks left over from templating.
//! Everything the extractors store goes through [`normalize_text`] first.

/// Characters that render as nothing but still break equality and tokenizing.
fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}'
    )
}

/// Strip invisible characters, collapse whitespace runs to a single space and trim.
///
/// Accepts either a `&str` or an `Option<&str>`; `None` and empty input
/// both yield an empty string.
pub fn normalize_text<'a>(raw: impl Into<Option<&'a str>>) -> String {
    let Some(raw) = raw.into() else {
        return String::new();
    };

    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;

    for c in raw.chars().filter(|c| !is_invisible(*c)) {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_and_trims() {
        assert_eq!(normalize_text("  Photo \n\t Editor  "), "Photo Editor");
    }

    #[test]
    fn removes_zero_width_and_bom() {
        assert_eq!(normalize_text("\u{FEFF}Cam\u{200B}era\u{00A0}Pro\u{200D}"), "Camera Pro");
    }

    #[test]
    fn none_and_empty_yield_empty_string() {
        assert_eq!(normalize_text(None), "");
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text(" \u{200B} "), "");
    }

    #[test]
    fn zero_width_between_spaces_does_not_leave_double_space() {
        assert_eq!(normalize_text("a \u{200B} b"), "a b");
    }

    #[test]
    fn is_idempotent() {
        let samples = [
            "  Photo \n Editor ",
            "\u{FEFF}  x\u{200B}  y ",
            "already clean",
            "\t\n",
            "Ünïcödé  ‘quoted’   text",
        ];
        for sample in samples {
            let once = normalize_text(sample);
            assert_eq!(normalize_text(once.as_str()), once, "sample: {sample:?}");
        }
    }
}
