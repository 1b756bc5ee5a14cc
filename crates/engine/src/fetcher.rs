use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::header::RANGE;
use reqwest::Client;
use tokio::sync::watch;

use crate::control::ControlEvent;
use crate::error::DownloaderError;
use crate::progress::ProgressPublisher;

/// Executes a single ranged `GET`, streaming bytes into an accumulated
/// buffer while publishing progress and honoring pause/cancel mid-stream.
#[async_trait]
pub trait RangeFetcher: Send + Sync {
    /// Fetches `bytes=start-end` from `url`. `control` is the live signal
    /// the engine's `pause()`/`cancel()` mutate; this is the mechanism
    /// §4.1 describes as "observable by the engine" and is what the
    /// per-segment drop logic below actually consults. `downloaded_before`
    /// is the session's committed total prior to this chunk; it is only
    /// used to compute a live cumulative figure for progress events as
    /// segments arrive and is never written back — `downloaded_bytes`
    /// only ever advances once the engine durably appends this chunk's
    /// full buffer, so a chunk dropped mid-stream by a pause/cancel never
    /// desyncs the resume offset.
    ///
    /// A failure to issue the request at all is a fatal [`DownloaderError::Fetch`]
    /// that propagates to the caller. A failure partway through the body
    /// stream is logged and absorbed: the call returns an empty buffer so
    /// the engine's existing empty-vs-non-empty retry branch handles it.
    async fn fetch(
        &self,
        url: &str,
        start: u64,
        end: u64,
        control: &watch::Receiver<ControlEvent>,
        progress: &ProgressPublisher,
        downloaded_before: u64,
        total_bytes: u64,
    ) -> Result<Vec<u8>, DownloaderError>;
}

/// [`RangeFetcher`] backed by a real `reqwest::Client`.
pub struct HttpRangeFetcher {
    client: Client,
}

impl HttpRangeFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RangeFetcher for HttpRangeFetcher {
    async fn fetch(
        &self,
        url: &str,
        start: u64,
        end: u64,
        control: &watch::Receiver<ControlEvent>,
        progress: &ProgressPublisher,
        downloaded_before: u64,
        total_bytes: u64,
    ) -> Result<Vec<u8>, DownloaderError> {
        let range = format!("bytes={}-{}", start, end);
        let response = self
            .client
            .get(url)
            .header(RANGE, range)
            .send()
            .await
            .map_err(|e| DownloaderError::Fetch(e.to_string()))?;

        let mut buf = Vec::new();
        let mut stream = response.bytes_stream();
        let mut live_total = downloaded_before;

        while let Some(segment) = stream.next().await {
            let segment: Bytes = match segment {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(error = %e, "range fetch stream error, chunk will be retried");
                    return Ok(Vec::new());
                }
            };

            if matches!(*control.borrow(), ControlEvent::Pause | ControlEvent::Cancel) {
                continue;
            }

            live_total += segment.len() as u64;
            progress.publish(segment.len() as u64, live_total, total_bytes);
            buf.extend_from_slice(&segment);
        }

        Ok(buf)
    }
}
