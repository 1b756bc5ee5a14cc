//! Maps a total byte count to a chunk count and width, and derives the
//! byte range for a given 1-based chunk index.

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;
const TB: u64 = GB * 1024;

/// The outcome of planning a download: how many chunks, and how wide each
/// one (save the last, which absorbs the remainder).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    pub max_chunks: u32,
    pub bytes_per_chunk: u64,
}

pub struct ChunkPlanner;

impl ChunkPlanner {
    /// Returns `None` when `total_bytes == 0`, signaling the caller should
    /// cancel the session outright. Otherwise picks the coarsest size
    /// bucket `total_bytes` falls into, derives a chunk count from it, and
    /// clamps that count to `max_chunks_cap`.
    pub fn plan(total_bytes: u64, max_chunks_cap: u32) -> Option<ChunkPlan> {
        if total_bytes == 0 {
            return None;
        }

        let max_chunks = if total_bytes >= MB {
            let base = if total_bytes >= TB {
                1000
            } else if total_bytes >= GB {
                100
            } else {
                10
            };
            (base / 3).max(1)
        } else {
            1
        };

        let max_chunks = max_chunks.min(max_chunks_cap).max(1);
        let bytes_per_chunk = total_bytes / max_chunks as u64;

        Some(ChunkPlan {
            max_chunks,
            bytes_per_chunk,
        })
    }
}

/// Computes the inclusive byte range for 1-based chunk index `k` out of
/// `max_chunks`.
///
/// `resume_start`, when set, overrides the computed start for exactly this
/// call — the caller is responsible for supplying it only for the first
/// chunk attempted after a resume. The final chunk's end is always
/// `total_bytes` outright rather than `k * bytes_per_chunk`, since integer
/// truncation in the planned width otherwise strands the last few bytes
/// unrequested.
pub fn range_for(k: u32, max_chunks: u32, bytes_per_chunk: u64, total_bytes: u64, resume_start: Option<u64>) -> (u64, u64) {
    let start = match resume_start {
        Some(s) => s,
        None if k == 1 => 0,
        None => (k as u64 - 1) * bytes_per_chunk + 1,
    };
    let end = if k >= max_chunks {
        total_bytes
    } else {
        k as u64 * bytes_per_chunk
    };
    (start, end)
}
