use async_trait::async_trait;
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH};
use reqwest::Client;

use crate::error::DownloaderError;

/// What the metadata probe learns about the remote resource before any
/// bytes are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    pub total_bytes: u64,
    pub can_buffer: bool,
}

/// Issues a `HEAD` and derives total size and range capability.
#[async_trait]
pub trait MetadataProber: Send + Sync {
    async fn probe(&self, url: &str) -> Result<Metadata, DownloaderError>;
}

/// [`MetadataProber`] backed by a real `reqwest::Client`.
pub struct HttpMetadataProber {
    client: Client,
}

impl HttpMetadataProber {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MetadataProber for HttpMetadataProber {
    async fn probe(&self, url: &str) -> Result<Metadata, DownloaderError> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| DownloaderError::Metadata(e.to_string()))?;

        let total_bytes = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);

        let can_buffer = response
            .headers()
            .get(ACCEPT_RANGES)
            .and_then(|v| v.to_str().ok())
            .map(|v| v == "bytes")
            .unwrap_or(false);

        tracing::debug!(url, total_bytes, can_buffer, "probed metadata");

        Ok(Metadata {
            total_bytes,
            can_buffer,
        })
    }
}
