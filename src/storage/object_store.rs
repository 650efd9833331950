// file: src/storage/object_store.rs
// description: bucket/object storage abstraction with local and in-memory backends
// reference: https://doc.rust-lang.org/std/fs/fn.rename.html

use crate::error::{PipelineError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

/// Named buckets holding whole objects. `put` replaces the object atomically:
/// a reader sees either the previous bytes or the new ones, never a mix.
pub trait ObjectStore: Send + Sync {
    fn ensure_bucket(&self, bucket: &str) -> Result<()>;

    /// Object names in the bucket, sorted. A missing bucket lists as empty.
    fn list(&self, bucket: &str) -> Result<Vec<String>>;

    fn get(&self, bucket: &str, object: &str) -> Result<Vec<u8>>;

    fn put(&self, bucket: &str, object: &str, data: &[u8]) -> Result<()>;

    fn exists(&self, bucket: &str, object: &str) -> Result<bool>;
}

/// Buckets are directories under `root`; objects are files.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| PipelineError::storage(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_path(&self, bucket: &str) -> PathBuf {
        self.root.join(bucket)
    }

    fn object_path(&self, bucket: &str, object: &str) -> PathBuf {
        self.bucket_path(bucket).join(object)
    }
}

impl ObjectStore for LocalObjectStore {
    fn ensure_bucket(&self, bucket: &str) -> Result<()> {
        let path = self.bucket_path(bucket);
        if !path.is_dir() {
            fs::create_dir_all(&path).map_err(|e| PipelineError::storage(&path, e))?;
            debug!("Created bucket: {}", bucket);
        }
        Ok(())
    }

    fn list(&self, bucket: &str) -> Result<Vec<String>> {
        let path = self.bucket_path(bucket);
        if !path.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&path).map_err(|e| PipelineError::storage(&path, e))? {
            let entry = entry.map_err(|e| PipelineError::storage(&path, e))?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            // in-flight temporary files from put()
            if name.starts_with('.') {
                continue;
            }
            names.push(name);
        }

        names.sort();
        Ok(names)
    }

    fn get(&self, bucket: &str, object: &str) -> Result<Vec<u8>> {
        let path = self.object_path(bucket, object);
        fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PipelineError::ArtifactMissing {
                    bucket: bucket.to_string(),
                    object: object.to_string(),
                }
            } else {
                PipelineError::storage(&path, e)
            }
        })
    }

    fn put(&self, bucket: &str, object: &str, data: &[u8]) -> Result<()> {
        self.ensure_bucket(bucket)?;

        let target = self.object_path(bucket, object);
        let staging = self
            .bucket_path(bucket)
            .join(format!(".{}.{}.tmp", object, Uuid::new_v4()));

        let written = fs::File::create(&staging).and_then(|mut file| {
            file.write_all(data)?;
            file.sync_all()
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&staging);
            return Err(PipelineError::storage(&staging, e));
        }

        fs::rename(&staging, &target).map_err(|e| {
            let _ = fs::remove_file(&staging);
            PipelineError::storage(&target, e)
        })?;

        debug!("Stored {}/{} ({} bytes)", bucket, object, data.len());
        Ok(())
    }

    fn exists(&self, bucket: &str, object: &str) -> Result<bool> {
        Ok(self.object_path(bucket, object).is_file())
    }
}

/// In-process store used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    buckets: Mutex<BTreeMap<String, BTreeMap<String, Vec<u8>>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, BTreeMap<String, Vec<u8>>>> {
        self.buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ObjectStore for MemoryObjectStore {
    fn ensure_bucket(&self, bucket: &str) -> Result<()> {
        self.lock().entry(bucket.to_string()).or_default();
        Ok(())
    }

    fn list(&self, bucket: &str) -> Result<Vec<String>> {
        Ok(self
            .lock()
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn get(&self, bucket: &str, object: &str) -> Result<Vec<u8>> {
        self.lock()
            .get(bucket)
            .and_then(|objects| objects.get(object))
            .cloned()
            .ok_or_else(|| PipelineError::ArtifactMissing {
                bucket: bucket.to_string(),
                object: object.to_string(),
            })
    }

    fn put(&self, bucket: &str, object: &str, data: &[u8]) -> Result<()> {
        self.lock()
            .entry(bucket.to_string())
            .or_default()
            .insert(object.to_string(), data.to_vec());
        Ok(())
    }

    fn exists(&self, bucket: &str, object: &str) -> Result<bool> {
        Ok(self
            .lock()
            .get(bucket)
            .is_some_and(|objects| objects.contains_key(object)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_local_put_get_replaces_object() {
        let temp = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp.path()).unwrap();

        store.put("bronze", "bronze_articles.parquet", b"first").unwrap();
        store.put("bronze", "bronze_articles.parquet", b"second").unwrap();

        assert_eq!(store.get("bronze", "bronze_articles.parquet").unwrap(), b"second");
        assert_eq!(store.list("bronze").unwrap(), vec!["bronze_articles.parquet"]);
    }

    #[test]
    fn test_local_missing_object() {
        let temp = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp.path()).unwrap();

        let err = store.get("silver", "silver_articles.parquet").unwrap_err();
        assert!(matches!(err, PipelineError::ArtifactMissing { .. }));
        assert!(store.list("silver").unwrap().is_empty());
        assert!(!store.exists("silver", "silver_articles.parquet").unwrap());
    }

    #[test]
    fn test_local_list_skips_hidden_files() {
        let temp = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp.path()).unwrap();
        store.ensure_bucket("raw").unwrap();
        fs::write(temp.path().join("raw/.partial.tmp"), b"x").unwrap();
        store.put("raw", "b.html", b"<p>b</p>").unwrap();
        store.put("raw", "a.html", b"<p>a</p>").unwrap();

        assert_eq!(store.list("raw").unwrap(), vec!["a.html", "b.html"]);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryObjectStore::new();
        store.put("raw", "x.html", b"<html></html>").unwrap();

        assert!(store.exists("raw", "x.html").unwrap());
        assert_eq!(store.list("raw").unwrap(), vec!["x.html"]);
        assert!(matches!(
            store.get("raw", "missing.html"),
            Err(PipelineError::ArtifactMissing { .. })
        ));
    }
}
