//! src/services/storage_service.rs
//!
//! StorageService — writes each upload as a single-entry zip archive into a
//! flat storage directory and opens archives again for download. There is no
//! metadata store: the directory listing is the only record of what exists.
//!
//! Archives are written to a hidden `.tmp-{uuid}` file by a blocking writer
//! task and renamed to `{id}.zip` only once the central directory has been
//! flushed, so readers never observe a half-written archive.

use crate::models::archive::{ArchiveIdStrategy, StoredArchive};
use bytes::Bytes;
use std::{
    io::{self, BufWriter, ErrorKind, Write},
    path::PathBuf,
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    sync::mpsc,
    task::{JoinError, JoinHandle},
};
use tracing::{debug, warn};
use uuid::Uuid;
use zip::{CompressionMethod, ZipWriter, result::ZipError, write::FileOptions};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("file name `{0}` is not allowed")]
    InvalidFileName(String),
    #[error("archive `{0}` not found")]
    NotFound(String),
    #[error("failed to create storage directory: {0}")]
    CreateDir(#[source] io::Error),
    #[error("failed to create archive file: {0}")]
    CreateArchive(#[source] io::Error),
    #[error("failed to start archive entry: {0}")]
    CreateEntry(#[source] ZipError),
    #[error("failed to write archive entry: {0}")]
    WriteEntry(#[source] io::Error),
    #[error("failed to finalize archive: {0}")]
    Finalize(#[source] ZipError),
    #[error("archive writer task failed: {0}")]
    Writer(#[from] JoinError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Chunks buffered between the request body and the archive writer.
const WRITE_QUEUE_DEPTH: usize = 8;
const MAX_FILE_NAME_LEN: usize = 255;
const TMP_PREFIX: &str = ".tmp-";

/// StorageService owns every filesystem path the relay touches.
#[derive(Clone, Debug)]
pub struct StorageService {
    /// Flat directory where `{id}.zip` archives live.
    pub base_path: PathBuf,
}

impl StorageService {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn archive_path(&self, file_name: &str) -> PathBuf {
        self.base_path.join(file_name)
    }

    /// Start a new archive whose single entry is named after `original_name`.
    ///
    /// Creates the storage directory if needed, picks an id with `strategy`
    /// and spawns the blocking zip writer. Bytes are fed with
    /// [`PendingArchive::write`]; nothing is visible under the final name
    /// until [`PendingArchive::commit`] succeeds.
    pub async fn begin_archive(
        &self,
        original_name: &str,
        strategy: ArchiveIdStrategy,
    ) -> StorageResult<PendingArchive> {
        let entry_name = archive_entry_name(original_name)?;

        fs::create_dir_all(&self.base_path)
            .await
            .map_err(StorageError::CreateDir)?;

        let id = strategy.next_id();
        let final_path = self.archive_path(&StoredArchive::file_name_for(&id));
        let tmp_path = self
            .base_path
            .join(format!("{}{}", TMP_PREFIX, Uuid::new_v4()));

        let file = File::create(&tmp_path)
            .await
            .map_err(StorageError::CreateArchive)?
            .into_std()
            .await;

        let (sender, receiver) = mpsc::channel(WRITE_QUEUE_DEPTH);
        let writer_entry = entry_name.clone();
        let writer =
            tokio::task::spawn_blocking(move || write_archive(file, &writer_entry, receiver));

        debug!(%id, entry = %entry_name, "started archive at {}", tmp_path.display());

        Ok(PendingArchive {
            id,
            entry_name,
            tmp_path,
            final_path,
            size_bytes: 0,
            sender: Some(sender),
            writer: Some(writer),
            settled: false,
        })
    }

    /// Open a stored archive for streaming out.
    ///
    /// Names are checked against the allow-list before any path is built, so
    /// `..`, separators and hidden temp files are never resolved.
    pub async fn open_archive(&self, file_name: &str) -> StorageResult<(File, u64)> {
        ensure_file_name_safe(file_name)?;

        let path = self.archive_path(file_name);
        let file = File::open(&path).await.map_err(|err| {
            debug!("cannot open {}: {}", path.display(), err);
            StorageError::NotFound(file_name.to_string())
        })?;

        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(StorageError::NotFound(file_name.to_string()));
        }

        Ok((file, metadata.len()))
    }

    /// Write, read back and delete a probe file in the storage directory.
    pub async fn probe_disk(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(StorageError::CreateDir)?;

        let probe_path = self.base_path.join(format!(".readyz-{}", Uuid::new_v4()));
        fs::write(&probe_path, b"readyz").await?;
        let read_back = fs::read(&probe_path).await;
        let removed = fs::remove_file(&probe_path).await;

        if read_back? != b"readyz" {
            return Err(StorageError::Io(io::Error::new(
                ErrorKind::InvalidData,
                "probe file content mismatch",
            )));
        }
        removed?;
        Ok(())
    }
}

/// An archive being written. Must end in [`commit`](Self::commit) or
/// [`abort`](Self::abort); if dropped unsettled, cleanup runs in the background.
#[derive(Debug)]
pub struct PendingArchive {
    id: String,
    entry_name: String,
    tmp_path: PathBuf,
    final_path: PathBuf,
    size_bytes: u64,
    sender: Option<mpsc::Sender<Bytes>>,
    writer: Option<JoinHandle<StorageResult<()>>>,
    settled: bool,
}

impl PendingArchive {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Append `chunk` to the archive entry.
    pub async fn write(&mut self, chunk: Bytes) -> StorageResult<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        let len = chunk.len() as u64;

        let sent = match self.sender.as_ref() {
            Some(sender) => sender.send(chunk).await.is_ok(),
            None => false,
        };
        if !sent {
            // the writer only hangs up early when it failed
            self.join_writer().await?;
            return Err(StorageError::WriteEntry(io::Error::new(
                ErrorKind::BrokenPipe,
                "archive writer stopped",
            )));
        }

        self.size_bytes += len;
        Ok(())
    }

    /// Finalize the zip and move it to `{id}.zip`.
    pub async fn commit(mut self) -> StorageResult<StoredArchive> {
        self.sender.take();

        if let Err(err) = self.join_writer().await {
            self.discard().await;
            return Err(err);
        }

        if fs::try_exists(&self.final_path).await.unwrap_or(false) {
            warn!(
                id = %self.id,
                "archive id collision, replacing {}",
                self.final_path.display()
            );
        }

        if let Err(err) = fs::rename(&self.tmp_path, &self.final_path).await {
            self.discard().await;
            return Err(StorageError::Io(err));
        }
        self.settled = true;

        Ok(StoredArchive {
            id: self.id.clone(),
            file_name: StoredArchive::file_name_for(&self.id),
            entry_name: self.entry_name.clone(),
            size_bytes: self.size_bytes,
        })
    }

    /// Stop writing and delete the partial archive.
    pub async fn abort(mut self) {
        self.sender.take();
        if let Err(err) = self.join_writer().await {
            debug!(id = %self.id, "archive writer ended with error during abort: {}", err);
        }
        self.discard().await;
    }

    async fn join_writer(&mut self) -> StorageResult<()> {
        match self.writer.take() {
            Some(handle) => handle.await?,
            None => Ok(()),
        }
    }

    async fn discard(&mut self) {
        match fs::remove_file(&self.tmp_path).await {
            Ok(_) => debug!("removed partial archive {}", self.tmp_path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!(
                "failed to remove partial archive {}: {}",
                self.tmp_path.display(),
                err
            ),
        }
        self.settled = true;
    }
}

impl Drop for PendingArchive {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        self.sender.take();
        let writer = self.writer.take();
        let tmp_path = self.tmp_path.clone();

        // a dropped request future (client went away) still owns a temp file
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Some(writer) = writer {
                    match writer.await {
                        Ok(Ok(())) => {}
                        Ok(Err(err)) => debug!("abandoned archive writer failed: {}", err),
                        Err(err) => warn!("abandoned archive writer did not finish: {}", err),
                    }
                }
                match fs::remove_file(&tmp_path).await {
                    Ok(_) => debug!("removed abandoned archive {}", tmp_path.display()),
                    Err(err) if err.kind() == ErrorKind::NotFound => {}
                    Err(err) => warn!(
                        "failed to remove abandoned archive {}: {}",
                        tmp_path.display(),
                        err
                    ),
                }
            });
        }
    }
}

/// Blocking half of an upload: drains `receiver` into a one-entry zip.
fn write_archive(
    file: std::fs::File,
    entry_name: &str,
    mut receiver: mpsc::Receiver<Bytes>,
) -> StorageResult<()> {
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    zip.start_file(entry_name, options)
        .map_err(StorageError::CreateEntry)?;

    while let Some(chunk) = receiver.blocking_recv() {
        zip.write_all(&chunk).map_err(StorageError::WriteEntry)?;
    }

    let buffered = zip.finish().map_err(StorageError::Finalize)?;
    let file = buffered
        .into_inner()
        .map_err(|err| StorageError::Finalize(ZipError::Io(err.into_error())))?;
    file.sync_all()
        .map_err(|err| StorageError::Finalize(ZipError::Io(err)))?;
    Ok(())
}

/// Reduce a client-supplied filename to the entry name stored in the zip.
///
/// Keeps only the text after the last `/`, byte for byte, and rejects names
/// that end up empty, `.` or `..`.
pub fn archive_entry_name(original: &str) -> StorageResult<String> {
    let base = original.rsplit('/').next().unwrap_or_default();

    if base.is_empty() || base == "." || base == ".." || base.contains('\0') {
        return Err(StorageError::InvalidFileName(original.to_string()));
    }
    Ok(base.to_string())
}

/// Allow-list check for names requested through `/file/{name}`.
///
/// Accepts ASCII letters, digits, `-`, `_` and `.`; rejects empty names,
/// names starting with `.` and anything containing `..`.
pub fn ensure_file_name_safe(name: &str) -> StorageResult<()> {
    let allowed = !name.is_empty()
        && name.len() <= MAX_FILE_NAME_LEN
        && !name.starts_with('.')
        && !name.contains("..")
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));

    if allowed {
        Ok(())
    } else {
        Err(StorageError::InvalidFileName(name.to_string()))
    }
}
