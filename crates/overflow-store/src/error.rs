//! Overflow store error types.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Overflow store error type.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The file could not be opened
    #[error("Failed to open overflow file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A record could not be appended
    #[error("Failed to append to overflow file {}: {source}", path.display())]
    Append {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading back a line failed
    #[error("Failed to read overflow file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The delivery mark could not be written
    #[error("Failed to mark line at offset {offset} in {}: {source}", path.display())]
    Mark {
        path: PathBuf,
        offset: u64,
        #[source]
        source: io::Error,
    },

    /// The drained file could not be deleted
    #[error("Failed to remove overflow file {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type alias using StoreError.
pub type StoreResult<T> = Result<T, StoreError>;
