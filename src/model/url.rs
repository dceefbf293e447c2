//! Turning free-form text lines into URLs a browser can open.

use once_cell::sync::Lazy;
use regex::Regex;

const DEFAULT_SCHEME: &str = "https://";

static KNOWN_SCHEME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:https?://|chrome://|mailto:)").expect("scheme pattern is valid")
});

/// Normalizes one line of user input.
///
/// Blank lines yield `None`. Anything without a recognized scheme is assumed
/// to be a web address and gets `https://` prepended.
pub fn normalize(line: &str) -> Option<String> {
    let url = line.trim();
    if url.is_empty() {
        return None;
    }
    if KNOWN_SCHEME.is_match(url) {
        Some(url.to_string())
    } else {
        Some(format!("{DEFAULT_SCHEME}{url}"))
    }
}

/// Normalizes every line of `text`, dropping blank ones and keeping order.
pub fn urls_from_text(text: &str) -> Vec<String> {
    text.split('\n').filter_map(normalize).collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn bare_hosts_get_https() {
        assert_eq!(normalize("example.com").as_deref(), Some("https://example.com"));
        assert_eq!(normalize("  example.com/inbox  ").as_deref(), Some("https://example.com/inbox"));
    }

    #[test]
    fn blank_lines_are_dropped() {
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("  "), None);
        assert_eq!(normalize("\t\r"), None);
    }

    #[test]
    fn known_schemes_are_kept_regardless_of_case() {
        for url in [
            "http://example.com",
            "HTTPS://example.com",
            "chrome://settings",
            "MAILTO:a@b.com",
            "mailto:a@b.com",
        ] {
            assert_eq!(normalize(url).as_deref(), Some(url));
        }
    }

    #[test]
    fn other_schemes_are_treated_as_hosts() {
        assert_eq!(normalize("ftp://files.example.com").as_deref(), Some("https://ftp://files.example.com"));
        assert_eq!(normalize("httpx.example.com").as_deref(), Some("https://httpx.example.com"));
    }

    #[test]
    fn text_blocks_keep_line_order() {
        assert_eq!(urls_from_text("a.com\n\nb.com"), vec!["https://a.com", "https://b.com"]);
        assert_eq!(
            urls_from_text("  \nhttp://c.com\r\n d.com \n"),
            vec!["http://c.com", "https://d.com"]
        );
        assert!(urls_from_text("").is_empty());
    }
}
