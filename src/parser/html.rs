// file: src/parser/html.rs
// description: html to clean text and metadata for news article pages
// reference: https://docs.rs/scraper

use crate::models::PageMetadata;
use crate::parser::metadata::MetadataRules;
use scraper::{Html, Node};
use thiserror::Error;

/// Elements whose text never reaches the extracted body. Head content
/// (title, meta) is captured separately as metadata.
const SKIPPED_ELEMENTS: &[&str] = &["head", "script", "style"];

#[derive(Debug, Clone)]
pub struct ParsedPage {
    pub metadata: PageMetadata,
    pub text: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HtmlError {
    #[error("document is not valid utf-8 (valid up to byte {valid_up_to})")]
    InvalidUtf8 { valid_up_to: usize },
}

pub struct HtmlExtractor {
    rules: MetadataRules,
}

impl HtmlExtractor {
    pub fn new() -> Self {
        Self::with_rules(MetadataRules::news_article())
    }

    pub fn with_rules(rules: MetadataRules) -> Self {
        Self { rules }
    }

    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<ParsedPage, HtmlError> {
        let html = std::str::from_utf8(bytes).map_err(|e| HtmlError::InvalidUtf8 {
            valid_up_to: e.valid_up_to(),
        })?;
        Ok(self.parse(html))
    }

    pub fn parse(&self, html: &str) -> ParsedPage {
        let document = Html::parse_document(html);
        ParsedPage {
            metadata: self.rules.extract(&document),
            text: extract_text(&document),
        }
    }
}

impl Default for HtmlExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// All body text nodes outside script/style, whitespace-normalized.
pub fn extract_text(document: &Html) -> String {
    let mut raw = String::new();

    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let skipped = node.ancestors().any(|ancestor| {
            matches!(
                ancestor.value(),
                Node::Element(el) if SKIPPED_ELEMENTS.contains(&el.name())
            )
        });
        if !skipped {
            raw.push_str(text);
        }
    }

    join_fragments(&raw)
}

/// Strips every line, splits lines on double spaces and joins the non-empty
/// fragments with single spaces. A lone `\r` ends a line too.
pub fn join_fragments(text: &str) -> String {
    text.split(['\n', '\r'])
        .map(str::trim)
        .flat_map(|line| line.split("  "))
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_and_style_are_dropped() {
        let page = HtmlExtractor::new().parse(
            r#"<html><head><title>T</title><style>body { color: red; }</style></head>
            <body><script>var tracking = 1;</script><p>Visible  paragraph</p></body></html>"#,
        );

        assert!(!page.text.contains("tracking"));
        assert!(!page.text.contains("color"));
        assert_eq!(page.text, "Visible paragraph");
    }

    #[test]
    fn test_join_fragments() {
        let text = "  first line  \n\n\tsecond   line\n   \nthird";
        assert_eq!(join_fragments(text), "first line second line third");
    }

    #[test]
    fn test_join_fragments_breaks_on_carriage_returns() {
        assert_eq!(join_fragments("foo\rbar"), "foo bar");
        assert_eq!(join_fragments("one\r\ntwo\r\n"), "one two");
        assert!(!join_fragments("a\r  b\rc").contains('\r'));
    }

    #[test]
    fn test_html_error_message() {
        let err = HtmlError::InvalidUtf8 { valid_up_to: 3 };
        assert_eq!(err.to_string(), "document is not valid utf-8 (valid up to byte 3)");
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let err = HtmlExtractor::new()
            .parse_bytes(&[0x3c, 0x70, 0x3e, 0xff, 0xfe])
            .unwrap_err();
        assert_eq!(err, HtmlError::InvalidUtf8 { valid_up_to: 3 });
    }

    #[test]
    fn test_word_count_of_body() {
        let body = vec!["word"; 150].join(" ");
        let html = format!("<html><body><p>{}</p></body></html>", body);
        let page = HtmlExtractor::new().parse(&html);
        assert_eq!(page.text.split_whitespace().count(), 150);
    }
}
