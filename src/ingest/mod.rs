// file: src/ingest/mod.rs
// description: producers for the raw bucket (local directories and http fetch)
// reference: internal module structure

pub mod fetch;
pub mod import;
pub mod naming;

pub use fetch::{FetchSummary, Fetcher};
pub use import::import_directory;
pub use naming::{raw_object_name, sanitize_filename, unique_object_name};
