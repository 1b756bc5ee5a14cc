//! Resumable, range-based HTTP file downloader core.
//!
//! [`DownloadEngine`] is the orchestrator: it probes a URL's metadata,
//! plans a chunking strategy, and runs a sequential, retrying,
//! pause/resume/cancel-aware fetch loop that materializes the result to
//! disk. Progress and lifecycle state are exposed as replay-latest
//! broadcast channels so any number of observers can subscribe without
//! coordinating with the caller driving the download itself.

mod control;
mod engine;
mod error;
mod fetcher;
mod metadata;
mod planner;
mod progress;
mod state;

pub use control::{ControlEvent, ControlToken};
pub use engine::{DownloadEngine, DownloadParams, DownloadedFile, DEFAULT_MAX_CHUNKS, DEFAULT_MAX_RETRIES};
pub use error::DownloaderError;
pub use fetcher::{HttpRangeFetcher, RangeFetcher};
pub use metadata::{HttpMetadataProber, Metadata, MetadataProber};
pub use planner::{range_for, ChunkPlan, ChunkPlanner};
pub use progress::{format_bytes, ProgressPublisher};
pub use state::{Phase, StatePublisher};
