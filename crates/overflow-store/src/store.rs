//! The overflow file itself.

use crate::cursor::PendingCursor;
use crate::{StoreError, StoreResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Append-only overflow file at a fixed path.
///
/// Every operation opens and closes its own handle, so the file may be
/// created, replayed and removed any number of times over a process lifetime.
#[derive(Debug, Clone)]
pub struct OverflowStore {
    path: PathBuf,
}

impl OverflowStore {
    /// Create a store for `path`. Nothing is touched on disk until the
    /// first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file currently exists.
    pub async fn exists(&self) -> bool {
        fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Append one newline-terminated record line.
    pub async fn append(&self, line: &[u8]) -> StoreResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|source| StoreError::Open {
                path: self.path.clone(),
                source,
            })?;

        // tokio completes file writes in the background; flush waits for them
        let written = async {
            file.write_all(line).await?;
            file.flush().await
        }
        .await;

        written.map_err(|source| StoreError::Append {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), bytes = line.len(), "Appended record to overflow file");
        Ok(())
    }

    /// Open a replay cursor positioned at the start of the file.
    ///
    /// Returns `None` when there is no overflow file.
    pub async fn open_cursor(&self) -> StoreResult<Option<PendingCursor>> {
        let reader = match File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Open {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let marker = match OpenOptions::new().write(true).open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Open {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        Ok(Some(PendingCursor::new(self.path.clone(), reader, marker)))
    }

    /// Delete the whole file. A missing file is not an error.
    pub async fn remove(&self) -> StoreResult<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Removed overflow file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
