use regex::Regex;
use scraper::ElementRef;

// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn element_text(element: &ElementRef) -> String {
    collapse_ws(&element.text().collect::<String>())
}

// First non-empty line of an element's rendered text.
pub fn first_text_line(element: &ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string()
}

pub fn is_placeholder(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "" | "n/a" | "null" | "none")
}

pub fn dedup_preserving_order(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

// Fallback when a page has no mailto link.
pub fn extract_email(text: &str) -> Option<String> {
    let email_re = Regex::new(r"[\w.\-]+@[\w.\-]+\.\w+").unwrap();
    email_re.find(text).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    #[test]
    fn collapses_whitespace() {
        assert_eq!(collapse_ws("  a \n b\t c  "), "a b c");
        assert_eq!(collapse_ws(""), "");
    }

    #[test]
    fn element_text_joins_nested_nodes() {
        let doc = Html::parse_fragment("<p>Hello <b>big</b>\n world</p>");
        let sel = Selector::parse("p").unwrap();
        let p = doc.select(&sel).next().unwrap();
        assert_eq!(element_text(&p), "Hello big world");
    }

    #[test]
    fn first_line_skips_blank_text() {
        let doc = Html::parse_fragment("<div>\n  Jane Doe\n  <a href=\"/p\">profile</a>\n</div>");
        let sel = Selector::parse("div").unwrap();
        let div = doc.select(&sel).next().unwrap();
        assert_eq!(first_text_line(&div), "Jane Doe");
    }

    #[test]
    fn placeholder_values_detected() {
        assert!(is_placeholder("N/A"));
        assert!(is_placeholder("null"));
        assert!(is_placeholder(""));
        assert!(!is_placeholder("Professor"));
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let values = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        assert_eq!(dedup_preserving_order(values), vec!["a", "b"]);
    }

    #[test]
    fn email_fallback_finds_address() {
        assert_eq!(
            extract_email("Contact: jane.doe@univ.edu for details"),
            Some("jane.doe@univ.edu".to_string())
        );
        assert_eq!(extract_email("no address here"), None);
    }
}
