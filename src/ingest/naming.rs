// file: src/ingest/naming.rs
// description: raw object naming from page titles and capture time

use crate::error::Result;
use crate::storage::ObjectStore;
use chrono::{DateTime, Utc};

/// Replaces every character that is not alphanumeric, `-` or `_` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `<YYYYMMDDHHMMSS>_<sanitized title>.html`
pub fn raw_object_name(title: &str, at: DateTime<Utc>) -> String {
    format!("{}_{}.html", at.format("%Y%m%d%H%M%S"), sanitize_filename(title))
}

/// Appends `_<n>` before the extension until the name is free in `bucket`.
pub fn unique_object_name(store: &dyn ObjectStore, bucket: &str, name: &str) -> Result<String> {
    if !store.exists(bucket, name)? {
        return Ok(name.to_string());
    }

    let stem = name.strip_suffix(".html").unwrap_or(name);
    let mut n = 1;
    loop {
        let candidate = format!("{}_{}.html", stem, n);
        if !store.exists(bucket, &candidate)? {
            return Ok(candidate);
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryObjectStore;
    use chrono::TimeZone;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Rates rise: what's next?"), "Rates_rise__what_s_next_");
        assert_eq!(sanitize_filename("keep-this_one"), "keep-this_one");
        assert_eq!(sanitize_filename("Zürich 2025"), "Zürich_2025");
    }

    #[test]
    fn test_raw_object_name() {
        let at = Utc.with_ymd_and_hms(2025, 7, 30, 6, 5, 9).unwrap();
        assert_eq!(raw_object_name("Big news", at), "20250730060509_Big_news.html");
    }

    #[test]
    fn test_unique_object_name_avoids_collisions() {
        let store = MemoryObjectStore::new();
        assert_eq!(unique_object_name(&store, "raw", "a.html").unwrap(), "a.html");

        store.put("raw", "a.html", b"x").unwrap();
        store.put("raw", "a_1.html", b"x").unwrap();
        assert_eq!(unique_object_name(&store, "raw", "a.html").unwrap(), "a_2.html");
    }
}
