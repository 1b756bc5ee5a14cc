use std::io;
use std::path::Path;

use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

/// Append-safe file materialization for the sequential chunk loop, plus the
/// delete-and-overwrite discipline used by the single-shot fallback path.
pub struct ChunkWriter;

impl ChunkWriter {
    /// Writes `bytes` to `path`, truncating the file first when `truncate`
    /// is set (the first chunk of a fresh or resumed-from-scratch download)
    /// and appending otherwise.
    pub async fn append(path: &Path, truncate: bool, bytes: &[u8]) -> io::Result<()> {
        let mut options = File::options();
        options.create(true).write(true);
        if truncate {
            options.truncate(true);
        } else {
            options.append(true);
        }

        let mut file = options.open(path).await?;
        file.write_all(bytes).await?;
        file.flush().await
    }

    /// Deletes any file already at `path`, then writes `bytes` as a new
    /// file. Used by the non-resumable single-shot path.
    pub async fn replace(path: &Path, bytes: &[u8]) -> io::Result<()> {
        if fs::metadata(path).await.is_ok() {
            fs::remove_file(path).await?;
        }

        let mut file = File::create(path).await?;
        file.write_all(bytes).await?;
        file.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_truncates_on_first_chunk_then_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");

        ChunkWriter::append(&path, true, b"hello ").await.unwrap();
        ChunkWriter::append(&path, false, b"world").await.unwrap();

        let contents = fs::read(&path).await.unwrap();
        assert_eq!(contents, b"hello world");
    }

    #[tokio::test]
    async fn append_truncate_discards_prior_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");

        ChunkWriter::append(&path, true, b"stale data that is long").await.unwrap();
        ChunkWriter::append(&path, true, b"fresh").await.unwrap();

        let contents = fs::read(&path).await.unwrap();
        assert_eq!(contents, b"fresh");
    }

    #[tokio::test]
    async fn replace_deletes_existing_file_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");

        fs::write(&path, b"old content, much longer than the new one")
            .await
            .unwrap();

        ChunkWriter::replace(&path, b"new").await.unwrap();

        let contents = fs::read(&path).await.unwrap();
        assert_eq!(contents, b"new");
    }

    #[tokio::test]
    async fn replace_writes_when_no_file_exists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.bin");

        ChunkWriter::replace(&path, b"content").await.unwrap();

        let contents = fs::read(&path).await.unwrap();
        assert_eq!(contents, b"content");
    }
}
