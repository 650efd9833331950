// file: src/parser/patterns.rs
// description: compiled regex patterns and css selectors for html extraction
// reference: https://docs.rs/regex, https://docs.rs/scraper

use lazy_static::lazy_static;
use regex::Regex;
use scraper::Selector;

lazy_static! {
    // Text cleanup
    pub static ref WHITESPACE_RUN: Regex = Regex::new(
        r"\s+"
    ).expect("WHITESPACE_RUN regex is valid");

    pub static ref WORD_TOKEN: Regex = Regex::new(
        r"\w+"
    ).expect("WORD_TOKEN regex is valid");

    // Title
    pub static ref TITLE: Selector = Selector::parse(
        "title"
    ).expect("TITLE selector is valid");

    // Description
    pub static ref META_DESCRIPTION: Selector = Selector::parse(
        r#"meta[name="description"]"#
    ).expect("META_DESCRIPTION selector is valid");

    pub static ref OG_DESCRIPTION: Selector = Selector::parse(
        r#"meta[property="og:description"]"#
    ).expect("OG_DESCRIPTION selector is valid");

    // Canonical url
    pub static ref LINK_CANONICAL: Selector = Selector::parse(
        r#"link[rel~="canonical"]"#
    ).expect("LINK_CANONICAL selector is valid");

    pub static ref OG_URL: Selector = Selector::parse(
        r#"meta[property="og:url"]"#
    ).expect("OG_URL selector is valid");

    // Publish date
    pub static ref ARTICLE_PUBLISHED_TIME: Selector = Selector::parse(
        r#"meta[property="article:published_time"]"#
    ).expect("ARTICLE_PUBLISHED_TIME selector is valid");

    pub static ref META_PUBLISH_DATE: Selector = Selector::parse(
        r#"meta[name="publish_date"]"#
    ).expect("META_PUBLISH_DATE selector is valid");

    pub static ref TIME_DATETIME: Selector = Selector::parse(
        "time[datetime]"
    ).expect("TIME_DATETIME selector is valid");
}

/// Collapses every whitespace run to a single space and trims both ends.
pub fn collapse_whitespace(input: &str) -> String {
    WHITESPACE_RUN.replace_all(input, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Breaking\n\t news   today "), "Breaking news today");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_word_tokens() {
        let tokens: Vec<_> = WORD_TOKEN
            .find_iter("AI-driven chips, 2025!")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(tokens, vec!["AI", "driven", "chips", "2025"]);
    }
}
