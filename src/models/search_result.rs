// file: src/models/search_result.rs
// description: Search result model with similarity scores
// reference: Used for vector similarity search results

use crate::utils::Validator;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Article id (gold `id`, i.e. the raw object name without extension)
    pub id: String,

    pub title: String,

    pub url: String,

    /// Stored document payload (the article's extracted text)
    pub document: String,

    /// Similarity score (higher is more similar, 0.0-1.0)
    pub score: f32,

    /// Distance metric reported by the index (lower is more similar)
    pub distance: Option<f32>,
}

impl SearchResult {
    pub fn new(
        id: String,
        title: String,
        url: String,
        document: String,
        distance: Option<f32>,
    ) -> Self {
        // score = 1 / (1 + distance); rows without a distance rank as exact matches
        let score = distance.map(|d| 1.0 / (1.0 + d)).unwrap_or(1.0);

        Self {
            id,
            title,
            url,
            document,
            score,
            distance,
        }
    }

    /// Format as a summary string for display
    pub fn format_summary(&self, max_content_len: usize) -> String {
        let content_preview = Validator::truncate_text(&self.document, max_content_len);

        format!(
            "Score: {:.4} | {} ({})\n{}\n",
            self.score, self.title, self.url, content_preview
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_result_creation() {
        let result = SearchResult::new(
            "20250730_article".to_string(),
            "Headline".to_string(),
            "https://example.com/article".to_string(),
            "Test content".to_string(),
            Some(0.25),
        );

        assert_eq!(result.score, 0.8);
        assert_eq!(result.distance, Some(0.25));
        assert_eq!(result.id, "20250730_article");
    }

    #[test]
    fn test_format_summary() {
        let result = SearchResult::new(
            "abc123".to_string(),
            "Chip shortage eases".to_string(),
            "https://example.com/chips".to_string(),
            "This is a very long content that will be truncated".to_string(),
            None,
        );

        let summary = result.format_summary(20);
        assert!(summary.contains("1.0000"));
        assert!(summary.contains("Chip shortage eases"));
        assert!(summary.contains("..."));
    }
}
