use std::io;
use std::path::PathBuf;

use async_trait::async_trait;

/// Resolves where a download should be written.
///
/// Implementers supply `documents_directory`; the default-method `resolve`
/// builds the `<documents>/cacheDirectory/<file_name>` path when the caller
/// hasn't supplied an explicit destination, and creates the parent directory
/// recursively either way.
#[async_trait]
pub trait PathProvider: Send + Sync {
    fn documents_directory(&self) -> io::Result<PathBuf>;

    async fn resolve(&self, explicit: Option<PathBuf>, file_name: &str) -> io::Result<PathBuf> {
        let path = match explicit {
            Some(p) => p,
            None => self
                .documents_directory()?
                .join("cacheDirectory")
                .join(file_name),
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        Ok(path)
    }
}

/// A [`PathProvider`] backed by the host OS's real documents directory.
pub struct DefaultPathProvider;

impl PathProvider for DefaultPathProvider {
    fn documents_directory(&self) -> io::Result<PathBuf> {
        dirs::document_dir().or_else(dirs::data_dir).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "no documents or data directory available on this platform",
            )
        })
    }
}
