//! Filesystem collaborators for the download engine: where a completed file
//! lands on disk, and how bytes get appended to it chunk by chunk.

mod path;
mod writer;

pub use path::{DefaultPathProvider, PathProvider};
pub use writer::ChunkWriter;
