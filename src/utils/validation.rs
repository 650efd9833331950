// file: src/utils/validation.rs
// description: input validation for ingest sources and cli arguments
// reference: input validation patterns

use crate::error::{PipelineError, Result};
use std::path::Path;

pub struct Validator;

impl Validator {
    pub fn validate_directory(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(PipelineError::Validation(format!(
                "Directory does not exist: {}",
                path.display()
            )));
        }

        if !path.is_dir() {
            return Err(PipelineError::Validation(format!(
                "Path is not a directory: {}",
                path.display()
            )));
        }

        Ok(())
    }

    pub fn is_html_file(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("html"))
    }

    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(PipelineError::Validation(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }

    pub fn validate_limit(limit: usize) -> Result<()> {
        if limit == 0 {
            return Err(PipelineError::Validation(
                "Result limit must be greater than 0".to_string(),
            ));
        }

        if limit > 1000 {
            return Err(PipelineError::Validation(
                "Result limit too large (max 1000)".to_string(),
            ));
        }

        Ok(())
    }

    /// Char-safe truncation with an ellipsis.
    pub fn truncate_text(text: &str, max_chars: usize) -> String {
        if text.chars().count() <= max_chars {
            text.to_string()
        } else {
            format!("{}...", text.chars().take(max_chars).collect::<String>())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_directory() {
        let temp = TempDir::new().unwrap();
        assert!(Validator::validate_directory(temp.path()).is_ok());
        assert!(Validator::validate_directory(Path::new("/nonexistent")).is_err());
    }

    #[test]
    fn test_is_html_file() {
        assert!(Validator::is_html_file(Path::new("story.html")));
        assert!(Validator::is_html_file(Path::new("STORY.HTML")));
        assert!(!Validator::is_html_file(Path::new("story.htm.txt")));
        assert!(!Validator::is_html_file(Path::new("story")));
    }

    #[test]
    fn test_validate_url() {
        assert!(Validator::validate_url("https://example.com").is_ok());
        assert!(Validator::validate_url("http://example.com").is_ok());
        assert!(Validator::validate_url("example.com").is_err());
        assert!(Validator::validate_url("ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_limit() {
        assert!(Validator::validate_limit(3).is_ok());
        assert!(Validator::validate_limit(0).is_err());
        assert!(Validator::validate_limit(1001).is_err());
    }

    #[test]
    fn test_truncate_text_is_char_safe() {
        assert_eq!(Validator::truncate_text("héllo wörld", 5), "héllo...");
        assert_eq!(Validator::truncate_text("short", 10), "short");
    }
}
