//! Integration tests for the forwarding client.
//!
//! - `harness.rs`  - Mock transport and helpers for building frames
//! - `no_loss.rs`  - Records are cached exactly once while the collector is down
//! - `drain.rs`    - Replay marking, partial drains and file removal
//! - `scenario.rs` - End-to-end runs, including a real loopback collector

mod scenario;
