//! Disk-backed retry queue for log records that could not be delivered.
//!
//! The overflow file is plain text, one framed record per line, only ever
//! appended to. Delivery is recorded in place: the first byte of a replayed
//! line is overwritten with [`MARK`], so offsets and lengths never change.
//! The file is removed as a whole once a replay pass finds nothing left to
//! send; it never shrinks line by line.
//!
//! This crate provides:
//! - [`OverflowStore`]: append, open a replay cursor, remove
//! - [`PendingCursor`]: iterates replayable lines and marks them delivered

mod cursor;
mod error;
mod store;

pub use cursor::{is_pending, PendingCursor, PendingLine};
pub use error::{StoreError, StoreResult};
pub use store::OverflowStore;

/// First byte of every well-formed record line.
pub const SENTINEL_BYTE: u8 = b'@';

/// Byte written over [`SENTINEL_BYTE`] once a line has been delivered.
pub const MARK: u8 = b'#';

/// Lines of this length or shorter are never replayed.
pub const MIN_PENDING_LEN: usize = 10;

/// Longest line read back in one piece; matches the transport frame cap.
pub const MAX_LINE_LEN: usize = 65_536;
