//! Background image search. Strictly best-effort: any failure degrades to an
//! empty asset list and the renderer falls back to slates.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

use crate::config::ImagesConfig;

/// Fetches background images for a topic.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Download up to `count` images for `query` into `out_dir`. Never fails;
    /// returns whatever could be fetched.
    async fn fetch(&self, query: &str, count: usize, out_dir: &Path) -> Vec<PathBuf>;
}

/// Provider used when no image search endpoint is configured. Always returns
/// an empty asset list, which the renderer treats as "use slates".
pub struct NoneImageProvider;

#[async_trait]
impl ImageProvider for NoneImageProvider {
    async fn fetch(&self, _query: &str, _count: usize, _out_dir: &Path) -> Vec<PathBuf> {
        Vec::new()
    }
}

/// Image provider backed by an Unsplash-style search endpoint.
pub struct RemoteImageProvider {
    config: ImagesConfig,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct SearchResult {
    url: String,
}

impl RemoteImageProvider {
    pub fn new(config: ImagesConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    async fn search(&self, query: &str, count: usize) -> Result<Vec<String>, reqwest::Error> {
        let url = format!(
            "{}/search?query={}&per_page={}",
            self.config.url.trim_end_matches('/'),
            urlencoding::encode(query),
            count
        );
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await?
            .error_for_status()?;
        let body: SearchResponse = response.json().await?;
        Ok(body.results.into_iter().map(|r| r.url).collect())
    }

    async fn download(&self, url: &str, out_path: &Path) -> Option<PathBuf> {
        let response = self.client.get(url).send().await.ok()?;
        let bytes = response.error_for_status().ok()?.bytes().await.ok()?;
        if bytes.is_empty() {
            return None;
        }
        tokio::fs::write(out_path, &bytes).await.ok()?;
        Some(out_path.to_path_buf())
    }
}

#[async_trait]
impl ImageProvider for RemoteImageProvider {
    async fn fetch(&self, query: &str, count: usize, out_dir: &Path) -> Vec<PathBuf> {
        let urls = match self.search(query, count).await {
            Ok(urls) => urls,
            Err(e) => {
                warn!("Image search failed for '{}': {}", query, e);
                return Vec::new();
            }
        };

        let mut paths = Vec::new();
        for (index, url) in urls.iter().take(count).enumerate() {
            let out_path = out_dir.join(format!("bg_{index:02}.jpg"));
            match self.download(url, &out_path).await {
                Some(path) => paths.push(path),
                None => warn!("Image download failed: {}", url),
            }
        }
        paths
    }
}
