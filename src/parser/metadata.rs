// file: src/parser/metadata.rs
// description: ordered fallback rules for article metadata in parsed html
// reference: https://docs.rs/scraper

use crate::models::PageMetadata;
use crate::parser::patterns::{
    ARTICLE_PUBLISHED_TIME, LINK_CANONICAL, META_DESCRIPTION, META_PUBLISH_DATE, OG_DESCRIPTION,
    OG_URL, TIME_DATETIME, TITLE,
};
use scraper::{Html, Selector};

/// Where a rule reads its value from once the selector matched.
#[derive(Debug, Clone, Copy)]
pub enum Extract {
    Text,
    Attr(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct MetadataRule {
    pub selector: &'static Selector,
    pub extract: Extract,
}

impl MetadataRule {
    const fn text(selector: &'static Selector) -> Self {
        Self {
            selector,
            extract: Extract::Text,
        }
    }

    const fn attr(selector: &'static Selector, name: &'static str) -> Self {
        Self {
            selector,
            extract: Extract::Attr(name),
        }
    }

    /// Value of the first element matching the selector, if non-empty.
    fn apply(&self, document: &Html) -> Option<String> {
        let element = document.select(self.selector).next()?;
        let value = match self.extract {
            Extract::Text => element.text().collect::<String>(),
            Extract::Attr(name) => element.value().attr(name)?.to_string(),
        };
        (!value.trim().is_empty()).then_some(value)
    }
}

/// Evaluates rules in order and returns the first non-empty value.
pub fn first_match(document: &Html, rules: &[MetadataRule]) -> Option<String> {
    rules.iter().find_map(|rule| rule.apply(document))
}

pub struct MetadataRules {
    pub title: Vec<MetadataRule>,
    pub description: Vec<MetadataRule>,
    pub url: Vec<MetadataRule>,
    pub publish_date: Vec<MetadataRule>,
}

impl MetadataRules {
    pub fn news_article() -> Self {
        Self {
            title: vec![MetadataRule::text(&*TITLE)],
            description: vec![
                MetadataRule::attr(&*META_DESCRIPTION, "content"),
                MetadataRule::attr(&*OG_DESCRIPTION, "content"),
            ],
            url: vec![
                MetadataRule::attr(&*LINK_CANONICAL, "href"),
                MetadataRule::attr(&*OG_URL, "content"),
            ],
            publish_date: vec![
                MetadataRule::attr(&*ARTICLE_PUBLISHED_TIME, "content"),
                MetadataRule::attr(&*META_PUBLISH_DATE, "content"),
                MetadataRule::attr(&*TIME_DATETIME, "datetime"),
            ],
        }
    }

    /// Title and description are trimmed; url and publish date are kept verbatim.
    pub fn extract(&self, document: &Html) -> PageMetadata {
        PageMetadata {
            title: first_match(document, &self.title)
                .map(|t| t.trim().to_string())
                .unwrap_or_default(),
            description: first_match(document, &self.description)
                .map(|d| d.trim().to_string())
                .unwrap_or_default(),
            url: first_match(document, &self.url).unwrap_or_default(),
            publish_date: first_match(document, &self.publish_date),
        }
    }
}

impl Default for MetadataRules {
    fn default() -> Self {
        Self::news_article()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> PageMetadata {
        MetadataRules::news_article().extract(&Html::parse_document(html))
    }

    #[test]
    fn test_full_metadata() {
        let meta = extract(
            r#"<html><head>
                <title>  Tech giants report earnings </title>
                <meta name="description" content=" Quarterly results are in. ">
                <link rel="canonical" href="https://news.example.com/earnings">
                <meta property="article:published_time" content="2025-07-30T08:15:00Z">
            </head><body></body></html>"#,
        );

        assert_eq!(meta.title, "Tech giants report earnings");
        assert_eq!(meta.description, "Quarterly results are in.");
        assert_eq!(meta.url, "https://news.example.com/earnings");
        assert_eq!(meta.publish_date.as_deref(), Some("2025-07-30T08:15:00Z"));
    }

    #[test]
    fn test_fallbacks_in_priority_order() {
        let meta = extract(
            r#"<html><head>
                <meta property="og:description" content="From open graph">
                <meta property="og:url" content="https://og.example.com/story">
                <meta name="publish_date" content="2025-07-29">
            </head><body><time datetime="2020-01-01">old</time></body></html>"#,
        );

        assert_eq!(meta.title, "");
        assert_eq!(meta.description, "From open graph");
        assert_eq!(meta.url, "https://og.example.com/story");
        assert_eq!(meta.publish_date.as_deref(), Some("2025-07-29"));
    }

    #[test]
    fn test_empty_value_falls_through() {
        let meta = extract(
            r#"<html><head>
                <meta name="description" content="   ">
                <meta property="og:description" content="Second choice">
            </head><body><time datetime="2025-06-01T10:00:00">June</time></body></html>"#,
        );

        assert_eq!(meta.description, "Second choice");
        assert_eq!(meta.publish_date.as_deref(), Some("2025-06-01T10:00:00"));
    }

    #[test]
    fn test_missing_publish_date_is_absent() {
        let meta = extract("<html><head><title>A</title></head><body>text</body></html>");
        assert_eq!(meta.title, "A");
        assert!(meta.publish_date.is_none());
        assert_eq!(meta.url, "");
    }
}
