// file: src/parser/mod.rs
// description: html parsing module exports
// reference: internal module structure

pub mod html;
pub mod metadata;
pub mod patterns;

pub use html::{HtmlError, HtmlExtractor, ParsedPage};
pub use metadata::{MetadataRule, MetadataRules};
pub use patterns::collapse_whitespace;
