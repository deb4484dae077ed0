use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::FetchConfig;
use crate::error::{Error, Result};

use super::BlobStore;

/// Blob store backed by an HTTP object-storage endpoint.
///
/// Uploads PUT the bytes at `{base_url}/{path}` and use that same URL as
/// the public reference; fetches GET any URL. Attachment URLs recorded on
/// work orders point at the same storage service, so one client serves
/// both directions.
pub struct HttpBlobStore {
    client: Client,
    base_url: String,
}

impl HttpBlobStore {
    /// Create a new HTTP blob store.
    ///
    /// # Panics
    /// Panics if the HTTP client cannot be created, which should only happen
    /// in extreme circumstances (e.g., TLS backend unavailable on the system).
    #[allow(clippy::expect_used)]
    pub fn new(base_url: impl Into<String>, config: &FetchConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url_for_path(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn upload(&self, path: &str, bytes: Bytes, content_type: &str) -> Result<String> {
        let url = self.url_for_path(path);
        debug!("Uploading {} bytes to {}", bytes.len(), url);

        let response = self
            .client
            .put(&url)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| Error::BlobUpload(format!("{url}: {e}")))?;

        if !response.status().is_success() {
            warn!("Upload to {} failed with HTTP {}", url, response.status());
            return Err(Error::BlobUpload(format!(
                "{url}: HTTP {}",
                response.status()
            )));
        }

        Ok(url)
    }

    async fn fetch(&self, url: &str) -> Result<Bytes> {
        debug!("Fetching {}", url);

        let response = self.client.get(url).send().await.map_err(|e| Error::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::FetchStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.bytes().await.map_err(|e| Error::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}
