//! TCPWebLog client: forwards piped log lines to a remote log server.
//!
//! Each input line is tagged with routing metadata and written to one
//! persistent TCP connection. While the server is unreachable, records are
//! appended to a local overflow file; after every successful live send the
//! overflow file is replayed and, once fully delivered, removed.
//!
//! # Core Invariants
//!
//! 1. **No silent loss on disconnect**: a record that cannot be sent is cached
//! 2. **Mark before forget**: a replayed line is marked before the next one is read
//! 3. **Whole-file removal**: the overflow file is removed only after a full pass
//! 4. **Single task**: the store and the connection are never used concurrently
//!
//! # Architecture
//!
//! ```text
//! stdin -> Forwarder -> TcpTransport -> log server
//!              |              ^
//!              v              |
//!        OverflowStore --> replay
//! ```

pub mod config;
pub mod error;
pub mod forwarder;
pub mod frame;
pub mod input;
pub mod replay;

#[cfg(test)]
mod tests;

pub use config::{Args, ClientConfig};
pub use error::{ClientError, ClientResult};
pub use forwarder::{Delivery, ForwardStats, Forwarder};
pub use frame::{FramedMessage, RecordTags};
pub use input::{read_line_bounded, MAX_LINE_LEN};
pub use replay::{drain, DrainOutcome, DrainReport, ReplayError};
