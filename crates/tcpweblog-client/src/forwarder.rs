//! Main forwarding loop.

use crate::frame::{FramedMessage, RecordTags};
use crate::input::{read_line_bounded, MAX_LINE_LEN};
use crate::replay::{self, DrainOutcome};
use overflow_store::OverflowStore;
use tokio::io::AsyncBufRead;
use tracing::{debug, error, info, warn};
use weblog_transport::Transport;

/// Where a single record ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Written to the live connection.
    Live,
    /// Appended to the overflow file.
    Cached,
    /// Neither sent nor cached.
    Dropped,
}

/// Running totals for one forwarder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardStats {
    pub live: u64,
    pub cached: u64,
    pub dropped: u64,
    pub replayed: u64,
}

/// Forwards input lines to the collector, falling back to the overflow file.
///
/// Each record is tried live first. A record that cannot be sent is cached;
/// after every successful live send the overflow file is drained, so a
/// backlog clears as soon as the connection is known to work again.
pub struct Forwarder<T> {
    tags: RecordTags,
    transport: T,
    store: OverflowStore,
    stats: ForwardStats,
    /// Set while the collector is unreachable, to log the outage once.
    in_outage: bool,
}

impl<T: Transport> Forwarder<T> {
    /// Create a new Forwarder.
    pub fn new(tags: RecordTags, transport: T, store: OverflowStore) -> Self {
        Self {
            tags,
            transport,
            store,
            stats: ForwardStats::default(),
            in_outage: false,
        }
    }

    pub fn stats(&self) -> ForwardStats {
        self.stats
    }

    pub fn store(&self) -> &OverflowStore {
        &self.store
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Forward every line of `input` until it ends.
    ///
    /// A read error is treated like end of input.
    pub async fn run<R>(&mut self, mut input: R) -> ForwardStats
    where
        R: AsyncBufRead + Unpin,
    {
        info!(
            stream = %self.tags.stream_name,
            cluster = self.tags.cluster_id,
            cache = %self.store.path().display(),
            "Starting forwarding loop"
        );

        let mut line = Vec::with_capacity(MAX_LINE_LEN);
        loop {
            line.clear();
            match read_line_bounded(&mut input, &mut line, MAX_LINE_LEN).await {
                Ok(0) => {
                    debug!("End of input");
                    break;
                }
                Ok(consumed) => {
                    if consumed > line.len() {
                        warn!(
                            length = consumed,
                            kept = line.len(),
                            "Input line too long, truncated"
                        );
                    }
                    self.forward(&line).await;
                }
                Err(e) => {
                    error!(error = %e, "Failed to read input, stopping");
                    break;
                }
            }
        }

        self.stats
    }

    /// Frame one input line and deliver it live or cache it.
    pub async fn forward(&mut self, payload: &[u8]) -> Delivery {
        let frame = FramedMessage::build(&self.tags, payload);
        if frame.is_truncated() {
            warn!(length = payload.len(), "Record exceeds frame size, truncated");
        }

        if let Err(e) = self.transport.ensure_connected().await {
            if self.in_outage {
                debug!(error = %e, "Log server still unavailable, caching record");
            } else {
                warn!(error = %e, "Log server unavailable, caching records");
                self.in_outage = true;
            }
            return self.cache(&frame).await;
        }

        if let Err(e) = self.transport.send(frame.as_bytes()).await {
            warn!(error = %e, "Send failed, caching record");
            self.in_outage = true;
            return self.cache(&frame).await;
        }

        if self.in_outage {
            info!("Log server reachable again");
            self.in_outage = false;
        }
        self.stats.live += 1;

        self.replay_backlog().await;
        Delivery::Live
    }

    /// Close the connection.
    pub async fn shutdown(&mut self) {
        self.transport.close().await;
        info!(
            live = self.stats.live,
            cached = self.stats.cached,
            dropped = self.stats.dropped,
            replayed = self.stats.replayed,
            "Forwarder stopped"
        );
    }

    async fn cache(&mut self, frame: &FramedMessage) -> Delivery {
        match self.store.append(frame.as_bytes()).await {
            Ok(()) => {
                self.stats.cached += 1;
                Delivery::Cached
            }
            Err(e) => {
                error!(error = %e, "Failed to cache record, record lost");
                self.stats.dropped += 1;
                Delivery::Dropped
            }
        }
    }

    async fn replay_backlog(&mut self) {
        match replay::drain(&self.store, &mut self.transport).await {
            Ok(DrainOutcome::NoBacklog) => {}
            Ok(DrainOutcome::Drained(report)) => {
                self.stats.replayed += report.replayed as u64;
            }
            Err(e) => {
                self.stats.replayed += e.replayed() as u64;
                if !self.transport.is_connected() {
                    self.in_outage = true;
                }
                warn!(error = %e, "Replay of overflow file stopped early");
            }
        }
    }
}
