//! Replay of the overflow file.
//!
//! One drain pass walks the overflow file from the start and sends every
//! pending line over the transport, marking each line as soon as its send
//! succeeds. The first failure ends the pass and leaves the file in place:
//! lines before it are marked, the failing line and everything after it are
//! untouched. Only a pass that reaches end of file removes the file.

use overflow_store::{OverflowStore, StoreError};
use thiserror::Error;
use tracing::{debug, info};
use weblog_transport::{Transport, TransportError};

/// Why a drain pass stopped early.
#[derive(Error, Debug)]
pub enum ReplayError {
    /// Local overflow file I/O failed
    #[error("Overflow store error after {replayed} replayed records: {source}")]
    Store {
        replayed: usize,
        #[source]
        source: StoreError,
    },

    /// The transport failed; the connection is now absent
    #[error("Replay interrupted after {replayed} records: {source}")]
    Transport {
        replayed: usize,
        #[source]
        source: TransportError,
    },
}

impl ReplayError {
    /// Records sent and marked before the pass stopped.
    pub fn replayed(&self) -> usize {
        match self {
            ReplayError::Store { replayed, .. } | ReplayError::Transport { replayed, .. } => {
                *replayed
            }
        }
    }
}

/// Counts from a completed drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Lines sent and marked during this pass.
    pub replayed: usize,
    /// Lines passed over as already marked or malformed.
    pub skipped: usize,
}

/// Result of a drain pass that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// There was no overflow file.
    NoBacklog,
    /// Every pending line was delivered and the file was removed.
    Drained(DrainReport),
}

/// Run one drain pass of `store` through `transport`.
pub async fn drain<T>(store: &OverflowStore, transport: &mut T) -> Result<DrainOutcome, ReplayError>
where
    T: Transport + ?Sized,
{
    let mut replayed = 0;

    let Some(mut cursor) = store.open_cursor().await.map_err(store_error(replayed))? else {
        return Ok(DrainOutcome::NoBacklog);
    };

    debug!(path = %store.path().display(), "Replaying overflow file");

    while let Some(line) = cursor.next_pending().await.map_err(store_error(replayed))? {
        if let Err(source) = transport.send(line.bytes()).await {
            return Err(ReplayError::Transport { replayed, source });
        }

        cursor
            .mark_delivered(&line)
            .await
            .map_err(store_error(replayed))?;
        replayed += 1;
    }

    let report = DrainReport {
        replayed,
        skipped: cursor.skipped(),
    };
    drop(cursor);

    store.remove().await.map_err(store_error(replayed))?;

    info!(
        path = %store.path().display(),
        replayed = report.replayed,
        skipped = report.skipped,
        "Overflow file drained"
    );

    Ok(DrainOutcome::Drained(report))
}

fn store_error(replayed: usize) -> impl FnOnce(StoreError) -> ReplayError {
    move |source| ReplayError::Store { replayed, source }
}
