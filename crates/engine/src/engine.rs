use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use storage::{ChunkWriter, PathProvider};

use crate::control::{ControlEvent, ControlToken};
use crate::error::DownloaderError;
use crate::fetcher::RangeFetcher;
use crate::metadata::MetadataProber;
use crate::planner::{range_for, ChunkPlanner};
use crate::progress::ProgressPublisher;
use crate::state::{Phase, StatePublisher};

/// `max_chunks` default before the planner further reduces it.
pub const DEFAULT_MAX_CHUNKS: u32 = 300;
/// `max_retries_per_chunk` default.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// A completed (or in-progress) download's file reference, published after
/// every successful chunk append and once more on completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub path: PathBuf,
    pub opaque_id: String,
    pub is_complete: bool,
}

/// Caller-supplied parameters for a `download()` call. Ignored on a
/// `resume()`-driven re-entry, where the session's recorded values are used
/// instead.
#[derive(Debug, Clone, Default)]
pub struct DownloadParams {
    pub destination_path: Option<PathBuf>,
    pub file_name: Option<String>,
    pub max_chunks: Option<u32>,
    pub retry_count: Option<u32>,
}

/// Mutable session bookkeeping, touched only by whichever single
/// `download`/`resume` invocation currently owns the chunk loop.
struct Session {
    url: String,
    destination_path: Option<PathBuf>,
    file_name: Option<String>,
    resolved_path: Option<PathBuf>,
    total_bytes: u64,
    can_buffer: bool,
    max_chunks: u32,
    bytes_per_chunk: u64,
    current_chunk: u32,
    downloaded_bytes: u64,
    max_retries_per_chunk: u32,
}

impl Session {
    fn new() -> Self {
        Self {
            url: String::new(),
            destination_path: None,
            file_name: None,
            resolved_path: None,
            total_bytes: 0,
            can_buffer: false,
            max_chunks: DEFAULT_MAX_CHUNKS,
            bytes_per_chunk: 0,
            current_chunk: 1,
            downloaded_bytes: 0,
            max_retries_per_chunk: DEFAULT_MAX_RETRIES,
        }
    }
}

struct Inner {
    prober: Arc<dyn MetadataProber>,
    fetcher: Arc<dyn RangeFetcher>,
    paths: Arc<dyn PathProvider>,

    control: ControlToken,
    state: StatePublisher,
    progress: ProgressPublisher,

    file_size: watch::Sender<Option<u64>>,
    downloaded_file: watch::Sender<Option<DownloadedFile>>,
    can_pause: watch::Sender<bool>,

    session: Mutex<Session>,
}

/// Orchestrates metadata probing, chunk planning, the sequential
/// retrying chunk loop, and the single-shot fallback for servers that
/// don't support ranges.
///
/// Cheap to clone: all shared state lives behind `Arc`, so a clone can be
/// handed to one task to drive `download()`/`resume()` while another task
/// holds on to it purely to call `pause()`/`cancel()` or read the
/// observables.
#[derive(Clone)]
pub struct DownloadEngine {
    inner: Arc<Inner>,
}

impl DownloadEngine {
    pub fn new(
        prober: Arc<dyn MetadataProber>,
        fetcher: Arc<dyn RangeFetcher>,
        paths: Arc<dyn PathProvider>,
    ) -> Self {
        let (file_size, _) = watch::channel(None);
        let (downloaded_file, _) = watch::channel(None);
        let (can_pause, _) = watch::channel(false);

        Self {
            inner: Arc::new(Inner {
                prober,
                fetcher,
                paths,
                control: ControlToken::new(),
                state: StatePublisher::new(),
                progress: ProgressPublisher::new(),
                file_size,
                downloaded_file,
                can_pause,
                session: Mutex::new(Session::new()),
            }),
        }
    }

    // -- observables ---------------------------------------------------

    pub fn progress(&self) -> watch::Receiver<u64> {
        self.inner.progress.subscribe_bytes()
    }

    pub fn formatted_progress(&self) -> watch::Receiver<String> {
        self.inner.progress.subscribe_formatted()
    }

    pub fn state(&self) -> watch::Receiver<Phase> {
        self.inner.state.subscribe()
    }

    pub fn can_pause(&self) -> watch::Receiver<bool> {
        self.inner.can_pause.subscribe()
    }

    pub fn downloaded_file(&self) -> Option<DownloadedFile> {
        self.inner.downloaded_file.borrow().clone()
    }

    /// Resolves once metadata has been probed; `0` if the engine is
    /// dropped before that happens.
    pub async fn file_size(&self) -> u64 {
        let mut rx = self.inner.file_size.subscribe();
        loop {
            if let Some(total) = *rx.borrow() {
                return total;
            }
            if rx.changed().await.is_err() {
                return 0;
            }
        }
    }

    // -- control ----------------------------------------------------

    pub fn pause(&self) {
        let can_buffer = *self.inner.can_pause.borrow();
        if can_buffer && self.inner.state.current() == Phase::Downloading {
            self.inner.state.transition(Phase::Paused);
            self.inner.control.pause();
        } else if !can_buffer {
            tracing::info!("pause requested on a non-resumable download; ignoring");
        }
    }

    pub fn cancel(&self) {
        if !matches!(self.inner.state.current(), Phase::Cancelled | Phase::Completed) {
            self.inner.state.transition(Phase::Cancelled);
            self.inner.control.cancel();
        }
    }

    pub fn dispose(&self) {
        self.cancel();
    }

    // -- downloading ----------------------------------------------------

    pub async fn download(&self, url: impl Into<String>, params: DownloadParams) -> Result<DownloadedFile, DownloaderError> {
        let mut session = self.inner.session.lock().await;
        session.url = url.into();
        session.destination_path = params.destination_path;
        session.file_name = params.file_name;
        if let Some(cap) = params.max_chunks {
            session.max_chunks = cap;
        }
        if let Some(retries) = params.retry_count {
            session.max_retries_per_chunk = retries;
        }
        session.current_chunk = 1;
        session.downloaded_bytes = 0;

        self.start(session, false).await
    }

    /// Only valid when the engine is `Paused` and not `Cancelled`;
    /// re-enters the chunk loop from `downloaded_bytes`.
    pub async fn resume(&self) -> Result<DownloadedFile, DownloaderError> {
        if self.inner.state.current() != Phase::Paused {
            return Err(DownloaderError::IllegalState(
                "resume() called while not paused".to_string(),
            ));
        }

        self.inner.control.resume();
        let session = self.inner.session.lock().await;
        self.start(session, true).await
    }

    async fn start(
        &self,
        mut session: tokio::sync::MutexGuard<'_, Session>,
        resuming: bool,
    ) -> Result<DownloadedFile, DownloaderError> {
        if !resuming {
            let metadata = self.inner.prober.probe(&session.url).await?;
            session.total_bytes = metadata.total_bytes;
            session.can_buffer = metadata.can_buffer;
            let _ = self.inner.file_size.send(Some(metadata.total_bytes));
            let _ = self.inner.can_pause.send(metadata.can_buffer);

            let file_name = resolve_file_name(&session.url, session.file_name.as_deref())?;
            let resolved = self
                .inner
                .paths
                .resolve(session.destination_path.clone(), &file_name)
                .await
                .map_err(|e| DownloaderError::Write(e.to_string()))?;
            session.resolved_path = Some(resolved);

            match ChunkPlanner::plan(session.total_bytes, session.max_chunks) {
                None => {
                    self.cancel();
                    return Err(DownloaderError::Cancel);
                }
                Some(plan) => {
                    session.max_chunks = plan.max_chunks;
                    session.bytes_per_chunk = plan.bytes_per_chunk;
                }
            }
        }

        self.inner.state.transition(Phase::Downloading);

        if !session.can_buffer {
            return self.download_single_shot(session).await;
        }

        self.run_chunk_loop(session, resuming).await
    }

    async fn run_chunk_loop(
        &self,
        mut session: tokio::sync::MutexGuard<'_, Session>,
        resuming: bool,
    ) -> Result<DownloadedFile, DownloaderError> {
        let path = session
            .resolved_path
            .clone()
            .expect("resolved_path is set before the chunk loop runs");
        let url = session.url.clone();
        let total = session.total_bytes;

        let mut tries = 1u32;
        let mut just_resumed = resuming;
        let control_rx = self.inner.control.subscribe();

        while session.current_chunk <= session.max_chunks && tries != session.max_retries_per_chunk {
            let resume_start = if just_resumed {
                Some(session.downloaded_bytes + 1)
            } else {
                None
            };
            let (start, end) = range_for(
                session.current_chunk,
                session.max_chunks,
                session.bytes_per_chunk,
                total,
                resume_start,
            );

            let bytes = self
                .inner
                .fetcher
                .fetch(
                    &url,
                    start,
                    end,
                    &control_rx,
                    &self.inner.progress,
                    session.downloaded_bytes,
                    total,
                )
                .await
                .inspect_err(|_| self.cancel())?;

            if matches!(self.inner.control.current(), ControlEvent::Pause | ControlEvent::Cancel) {
                break;
            }

            if !bytes.is_empty() {
                let is_first = session.current_chunk == 1;
                ChunkWriter::append(&path, is_first, &bytes)
                    .await
                    .map_err(|e| DownloaderError::Write(e.to_string()))
                    .inspect_err(|_| self.cancel())?;

                session.downloaded_bytes += bytes.len() as u64;
                session.current_chunk += 1;
                tries = 0;
                just_resumed = false;

                let is_complete = session.current_chunk > session.max_chunks;
                let file = DownloadedFile {
                    path: path.clone(),
                    opaque_id: session.url.clone(),
                    is_complete,
                };
                let _ = self.inner.downloaded_file.send(Some(file.clone()));

                if is_complete {
                    self.inner.state.transition(Phase::Completed);
                    return Ok(file);
                }
            } else {
                tries += 1;
                tracing::warn!(chunk = session.current_chunk, tries, "chunk attempt failed, retrying");
            }
        }

        match self.inner.control.current() {
            ControlEvent::Pause => Err(DownloaderError::Pause),
            ControlEvent::Cancel => Err(DownloaderError::Cancel),
            _ => Err(DownloaderError::Fetch(format!(
                "chunk {} exhausted its retries",
                session.current_chunk
            ))),
        }
    }

    async fn download_single_shot(
        &self,
        mut session: tokio::sync::MutexGuard<'_, Session>,
    ) -> Result<DownloadedFile, DownloaderError> {
        let path = session
            .resolved_path
            .clone()
            .expect("resolved_path is set before the single-shot path runs");
        let url = session.url.clone();
        let total = session.total_bytes;

        let control_rx = self.inner.control.subscribe();
        let end = total.saturating_sub(1);
        let bytes = self
            .inner
            .fetcher
            .fetch(&url, 0, end, &control_rx, &self.inner.progress, 0, total)
            .await
            .inspect_err(|_| self.cancel())?;

        if self.inner.control.current() == ControlEvent::Cancel {
            return Err(DownloaderError::Cancel);
        }

        ChunkWriter::replace(&path, &bytes)
            .await
            .map_err(|e| DownloaderError::Write(e.to_string()))
            .inspect_err(|_| self.cancel())?;
        session.downloaded_bytes = bytes.len() as u64;

        let file = DownloadedFile {
            path,
            opaque_id: session.url.clone(),
            is_complete: true,
        };
        let _ = self.inner.downloaded_file.send(Some(file.clone()));
        self.inner.state.transition(Phase::Completed);
        Ok(file)
    }
}

fn resolve_file_name(url: &str, explicit: Option<&str>) -> Result<String, DownloaderError> {
    if let Some(name) = explicit {
        if !name.is_empty() {
            return Ok(name.to_string());
        }
    }

    let derived = url.rsplit('/').next().unwrap_or("").to_string();
    if derived.is_empty() {
        return Err(DownloaderError::FileNameIndeterminate);
    }
    Ok(derived)
}
