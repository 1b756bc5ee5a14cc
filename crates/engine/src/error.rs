use thiserror::Error;

/// Every failure mode the engine's public API can surface.
///
/// `Pause` and `Cancel` are control-flow signals rather than true failures:
/// they exist so the terminal handle returned by `download`/`resume` has a
/// uniform way to unblock a waiting caller when the session is interrupted
/// from outside the chunk loop.
#[derive(Debug, Error)]
pub enum DownloaderError {
    #[error("failed to probe metadata: {0}")]
    Metadata(String),

    #[error("could not determine a file name from the url or caller")]
    FileNameIndeterminate,

    #[error("download paused")]
    Pause,

    #[error("download cancelled")]
    Cancel,

    #[error("illegal state: {0}")]
    IllegalState(String),

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("write failed: {0}")]
    Write(String),
}
