//! In-memory fakes standing in for the real HTTP/filesystem collaborators,
//! so the engine-level scenarios in tests/session_lifecycle.rs run fully
//! offline and deterministically.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::watch;

use engine::{ControlEvent, DownloaderError, Metadata, MetadataProber, ProgressPublisher, RangeFetcher};
use storage::PathProvider;

pub struct FakeMetadataProber {
    pub metadata: Metadata,
}

#[async_trait]
impl MetadataProber for FakeMetadataProber {
    async fn probe(&self, _url: &str) -> Result<Metadata, DownloaderError> {
        Ok(self.metadata)
    }
}

/// A [`PathProvider`] rooted at a fixed temp directory, so tests never
/// touch the real host documents directory.
pub struct FixedPathProvider {
    pub root: PathBuf,
}

impl PathProvider for FixedPathProvider {
    fn documents_directory(&self) -> std::io::Result<PathBuf> {
        Ok(self.root.clone())
    }
}

type Trigger = (u32, Arc<dyn Fn() + Send + Sync>);

/// A [`RangeFetcher`] over an in-memory "remote file", split into fixed
/// size segments per call to mimic a real streamed body. A one-shot
/// trigger can be armed to fire partway through a specific call (by
/// 1-based call index), simulating an externally-issued pause/cancel
/// arriving mid-stream.
pub struct FakeRangeFetcher {
    content: Vec<u8>,
    segment_size: usize,
    call_count: AtomicU32,
    trigger: Mutex<Option<Trigger>>,
    pub fetched_ranges: Mutex<Vec<(u64, u64)>>,
}

impl FakeRangeFetcher {
    pub fn new(content: Vec<u8>) -> Self {
        Self {
            content,
            segment_size: 64,
            call_count: AtomicU32::new(0),
            trigger: Mutex::new(None),
            fetched_ranges: Mutex::new(Vec::new()),
        }
    }

    /// Arms a callback to fire after the first segment of the `call_index`'th
    /// (1-based) `fetch` call has already been folded into the buffer.
    pub fn trigger_after_first_segment_of_call(&self, call_index: u32, f: impl Fn() + Send + Sync + 'static) {
        *self.trigger.lock().unwrap() = Some((call_index, Arc::new(f)));
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RangeFetcher for FakeRangeFetcher {
    async fn fetch(
        &self,
        _url: &str,
        start: u64,
        end: u64,
        control: &watch::Receiver<ControlEvent>,
        progress: &ProgressPublisher,
        downloaded_before: u64,
        total_bytes: u64,
    ) -> Result<Vec<u8>, DownloaderError> {
        let this_call = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.fetched_ranges.lock().unwrap().push((start, end));

        let last_index = (self.content.len() as u64).saturating_sub(1);
        let clamped_end = end.min(last_index);
        let slice = if start > clamped_end {
            &[][..]
        } else {
            &self.content[start as usize..=clamped_end as usize]
        };

        let mut buf = Vec::new();
        let mut live_total = downloaded_before;
        for (i, segment) in slice.chunks(self.segment_size).enumerate() {
            tokio::task::yield_now().await;

            if matches!(*control.borrow(), ControlEvent::Pause | ControlEvent::Cancel) {
                continue;
            }

            live_total += segment.len() as u64;
            progress.publish(segment.len() as u64, live_total, total_bytes);
            buf.extend_from_slice(segment);

            if i == 0 {
                let armed = self.trigger.lock().unwrap().clone();
                if let Some((idx, f)) = armed {
                    if idx == this_call {
                        f();
                    }
                }
            }
        }

        Ok(buf)
    }
}

pub fn deterministic_content(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
