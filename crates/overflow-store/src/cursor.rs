//! Replay cursor over the overflow file.
//!
//! Reading and marking go through two separate handles: a buffered reader
//! that only moves forward, and a write handle that seeks back to the start
//! of an already-read line to overwrite its first byte. A mark therefore
//! never moves the read position.

use crate::{StoreError, StoreResult, MARK, MAX_LINE_LEN, MIN_PENDING_LEN, SENTINEL_BYTE};
use std::io::SeekFrom;
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufReader};
use tracing::trace;

/// Whether a line read from the overflow file should be replayed.
///
/// Marked lines start with [`MARK`] and fail the sentinel check; torn or
/// foreign lines fail either check.
pub fn is_pending(line: &[u8]) -> bool {
    line.first() == Some(&SENTINEL_BYTE) && line.len() > MIN_PENDING_LEN
}

/// A replayable line and the offset of its first byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLine {
    offset: u64,
    bytes: Vec<u8>,
}

impl PendingLine {
    /// Byte offset of the line start in the overflow file.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The raw line, including its trailing newline when present.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Forward-only iterator over the pending lines of one overflow file.
pub struct PendingCursor {
    path: PathBuf,
    reader: BufReader<File>,
    marker: File,
    /// Offset of the next unread byte.
    offset: u64,
    skipped: usize,
}

impl PendingCursor {
    pub(crate) fn new(path: PathBuf, reader: File, marker: File) -> Self {
        Self {
            path,
            reader: BufReader::with_capacity(MAX_LINE_LEN, reader),
            marker,
            offset: 0,
            skipped: 0,
        }
    }

    /// Read forward to the next pending line.
    ///
    /// Returns `None` at end of file.
    pub async fn next_pending(&mut self) -> StoreResult<Option<PendingLine>> {
        loop {
            let start = self.offset;
            let mut bytes = Vec::new();

            let n = (&mut self.reader)
                .take(MAX_LINE_LEN as u64)
                .read_until(b'\n', &mut bytes)
                .await
                .map_err(|source| StoreError::Read {
                    path: self.path.clone(),
                    source,
                })?;

            if n == 0 {
                return Ok(None);
            }
            self.offset += n as u64;

            if is_pending(&bytes) {
                return Ok(Some(PendingLine {
                    offset: start,
                    bytes,
                }));
            }

            trace!(offset = start, len = n, "Skipping non-pending line");
            self.skipped += 1;
        }
    }

    /// Record `line` as delivered by overwriting its first byte with [`MARK`].
    pub async fn mark_delivered(&mut self, line: &PendingLine) -> StoreResult<()> {
        let written = async {
            self.marker.seek(SeekFrom::Start(line.offset)).await?;
            self.marker.write_all(&[MARK]).await?;
            self.marker.flush().await
        }
        .await;

        written.map_err(|source| StoreError::Mark {
            path: self.path.clone(),
            offset: line.offset,
            source,
        })
    }

    /// Number of lines passed over so far because they were marked or malformed.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}
