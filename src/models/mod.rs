// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod bronze;
pub mod columnar;
pub mod gold;
pub mod search_result;
pub mod silver;

pub use bronze::{BronzeRecord, PageMetadata};
pub use columnar::ColumnarRecord;
pub use gold::GoldRecord;
pub use search_result::SearchResult;
pub use silver::SilverRecord;
