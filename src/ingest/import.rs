// file: src/ingest/import.rs
// description: copy html files from a local directory into the raw bucket
// reference: https://docs.rs/walkdir

use crate::error::{PipelineError, Result};
use crate::storage::ObjectStore;
use crate::utils::validation::Validator;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Stores every `*.html` file under `dir` in `bucket`, keyed by file name.
/// Returns the stored object names in walk order.
pub fn import_directory(store: &dyn ObjectStore, bucket: &str, dir: &Path) -> Result<Vec<String>> {
    Validator::validate_directory(dir)?;
    info!("Importing html documents from {}", dir.display());

    store.ensure_bucket(bucket)?;
    let mut stored = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() || !Validator::is_html_file(entry.path()) {
            continue;
        }

        let Some(name) = entry.file_name().to_str() else {
            warn!("Skipping non utf-8 file name: {}", entry.path().display());
            continue;
        };
        // raw objects are matched on a lowercase suffix
        let object = match name.strip_suffix(".html") {
            Some(_) => name.to_string(),
            None => format!("{}.html", &name[..name.len() - ".html".len()]),
        };

        let bytes =
            fs::read(entry.path()).map_err(|e| PipelineError::storage(entry.path(), e))?;
        store.put(bucket, &object, &bytes)?;

        debug!("Imported {} as {}/{}", entry.path().display(), bucket, object);
        stored.push(object);
    }

    info!("Imported {} documents into '{}'", stored.len(), bucket);
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryObjectStore;
    use tempfile::TempDir;

    #[test]
    fn test_imports_only_html_files() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("one.html"), "<title>One</title>").unwrap();
        fs::write(temp.path().join("notes.txt"), "ignored").unwrap();
        fs::create_dir(temp.path().join("nested")).unwrap();
        fs::write(temp.path().join("nested").join("Two.HTML"), "<title>Two</title>").unwrap();

        let store = MemoryObjectStore::new();
        let stored = import_directory(&store, "raw", temp.path()).unwrap();

        assert_eq!(stored, vec!["Two.html".to_string(), "one.html".to_string()]);
        assert_eq!(store.get("raw", "one.html").unwrap(), b"<title>One</title>");
    }

    #[test]
    fn test_missing_directory_is_rejected() {
        let store = MemoryObjectStore::new();
        let err = import_directory(&store, "raw", Path::new("/nonexistent/dir")).unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }
}
