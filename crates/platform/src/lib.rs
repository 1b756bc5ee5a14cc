//! Typed contracts for collaborators that live outside the download engine.
//!
//! Everything in this crate describes an integration surface the engine
//! assumes a host application provides; nothing here is implemented or
//! depended on by the `engine` crate itself. It exists so those contracts
//! are documented in the same workspace as the component that relies on
//! them, not to provide working functionality.

use std::path::PathBuf;

/// A single download request declared by the host before any engine
/// instance exists, e.g. a preloaded queue read from the host's own
/// storage at startup. The engine has no notion of a queue; a host wires
/// these into individual `DownloadEngine::download` calls itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadedDownloadRequest {
    pub url: String,
    pub destination_path: Option<PathBuf>,
    pub file_name: Option<String>,
}

/// Process-wide coordination ensuring at most one audio-like session plays
/// at a time. Some hosts pair download progress with a "now playing"
/// affordance (e.g. a completion chime) that must cooperate with whatever
/// already owns playback; this trait names that cooperation point without
/// prescribing an implementation.
pub trait ExclusivePlaybackGate: Send + Sync {
    /// Attempts to acquire exclusive playback for `session_id`. Returns
    /// `false` if another session already holds it.
    fn acquire(&self, session_id: &str) -> bool;

    /// Releases playback previously acquired for `session_id`. A no-op if
    /// `session_id` does not currently hold it.
    fn release(&self, session_id: &str);
}
