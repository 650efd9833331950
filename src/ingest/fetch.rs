// file: src/ingest/fetch.rs
// description: download article pages over http into the raw bucket
// reference: https://docs.rs/reqwest

use crate::config::IngestConfig;
use crate::error::Result;
use crate::ingest::naming::{raw_object_name, unique_object_name};
use crate::parser::HtmlExtractor;
use crate::storage::ObjectStore;
use crate::utils::validation::Validator;
use chrono::Utc;
use reqwest::{Client, Url};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct FetchSummary {
    pub stored: Vec<String>,
    pub failed: Vec<String>,
}

pub struct Fetcher {
    client: Client,
    extractor: HtmlExtractor,
}

/// Object title for a page without a `<title>`: host and path of its url.
fn title_from_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => format!(
            "{}{}",
            parsed.host_str().unwrap_or_default(),
            parsed.path().trim_end_matches('/')
        ),
        Err(_) => url.to_string(),
    }
}

impl Fetcher {
    pub fn new(config: &IngestConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.fetch_timeout())
            .connect_timeout(config.fetch_timeout())
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            extractor: HtmlExtractor::new(),
        })
    }

    pub async fn fetch_page(&self, url: &str) -> Result<String> {
        Validator::validate_url(url)?;
        debug!("Fetching {}", url);

        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    /// Fetches each url and stores the page under a title-derived name.
    /// Failed urls are logged and reported, never fatal.
    pub async fn fetch_into(
        &self,
        store: &dyn ObjectStore,
        bucket: &str,
        urls: &[String],
    ) -> Result<FetchSummary> {
        store.ensure_bucket(bucket)?;
        let mut summary = FetchSummary::default();

        for url in urls {
            let html = match self.fetch_page(url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("Failed to fetch {} | {}", url, e);
                    summary.failed.push(url.clone());
                    continue;
                }
            };

            let title = self.extractor.parse(&html).metadata.title;
            let title = if title.is_empty() {
                title_from_url(url)
            } else {
                title
            };

            let name = unique_object_name(store, bucket, &raw_object_name(&title, Utc::now()))?;
            store.put(bucket, &name, html.as_bytes())?;

            info!("Uploaded to raw bucket: {}", name);
            summary.stored.push(name);
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryObjectStore;

    #[test]
    fn test_title_from_url() {
        assert_eq!(
            title_from_url("https://news.example.com/world/story-1/"),
            "news.example.com/world/story-1"
        );
        assert_eq!(title_from_url("not a url"), "not a url");
    }

    #[tokio::test]
    async fn test_invalid_urls_are_reported_not_fatal() {
        let fetcher = Fetcher::new(&crate::config::Config::default_config().ingest).unwrap();
        let store = MemoryObjectStore::new();

        let summary = fetcher
            .fetch_into(&store, "raw", &["ftp://example.com/a".to_string()])
            .await
            .unwrap();

        assert!(summary.stored.is_empty());
        assert_eq!(summary.failed, vec!["ftp://example.com/a".to_string()]);
    }
}
