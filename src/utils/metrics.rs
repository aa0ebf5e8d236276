//! Session Metrics
//!
//! Counters describing the traffic of one bridge session.
//!
//! Both session tasks update the same [`BridgeMetrics`] through an `Arc`;
//! atomic counters keep that lock-free.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Metrics collector for one bridge session
#[derive(Debug)]
pub struct BridgeMetrics {
    /// Messages written to the client (handshake, output, pong)
    pub messages_sent: AtomicU64,
    /// Messages received from the client
    pub messages_received: AtomicU64,
    /// Raw bytes read from the backend
    pub backend_bytes_read: AtomicU64,
    /// Decoded bytes written to the backend
    pub backend_bytes_written: AtomicU64,
    /// Pings answered
    pub pings: AtomicU64,
    /// Resizes forwarded to the backend
    pub resizes: AtomicU64,
    /// Inputs dropped because the session is read-only or the input was empty
    pub inputs_discarded: AtomicU64,
    /// Successful encoding switches
    pub encoding_switches: AtomicU64,
    /// Messages that ended the session with a protocol or codec error
    pub protocol_errors: AtomicU64,
    start_time: Instant,
}

impl BridgeMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            messages_sent: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
            backend_bytes_read: AtomicU64::new(0),
            backend_bytes_written: AtomicU64::new(0),
            pings: AtomicU64::new(0),
            resizes: AtomicU64::new(0),
            inputs_discarded: AtomicU64::new(0),
            encoding_switches: AtomicU64::new(0),
            protocol_errors: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a message written to the client
    pub fn message_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a message received from the client
    pub fn message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a chunk of backend output
    pub fn backend_read(&self, byte_count: u64) {
        self.backend_bytes_read
            .fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Record input delivered to the backend
    pub fn backend_written(&self, byte_count: u64) {
        self.backend_bytes_written
            .fetch_add(byte_count, Ordering::Relaxed);
    }

    pub fn ping(&self) {
        self.pings.fetch_add(1, Ordering::Relaxed);
    }

    pub fn resize(&self) {
        self.resizes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn input_discarded(&self) {
        self.inputs_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn encoding_switch(&self) {
        self.encoding_switches.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a protocol error
    pub fn protocol_error(&self) {
        self.protocol_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            backend_bytes_read: self.backend_bytes_read.load(Ordering::Relaxed),
            backend_bytes_written: self.backend_bytes_written.load(Ordering::Relaxed),
            pings: self.pings.load(Ordering::Relaxed),
            resizes: self.resizes.load(Ordering::Relaxed),
            inputs_discarded: self.inputs_discarded.load(Ordering::Relaxed),
            encoding_switches: self.encoding_switches.load(Ordering::Relaxed),
            protocol_errors: self.protocol_errors.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            messages_sent = snapshot.messages_sent,
            messages_received = snapshot.messages_received,
            backend_bytes_read = snapshot.backend_bytes_read,
            backend_bytes_written = snapshot.backend_bytes_written,
            pings = snapshot.pings,
            resizes = snapshot.resizes,
            inputs_discarded = snapshot.inputs_discarded,
            encoding_switches = snapshot.encoding_switches,
            protocol_errors = snapshot.protocol_errors,
            uptime_seconds = snapshot.uptime_seconds,
            "Bridge session metrics"
        );
    }
}

impl Default for BridgeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub messages_sent: u64,
    pub messages_received: u64,
    pub backend_bytes_read: u64,
    pub backend_bytes_written: u64,
    pub pings: u64,
    pub resizes: u64,
    pub inputs_discarded: u64,
    pub encoding_switches: u64,
    pub protocol_errors: u64,
    pub uptime_seconds: u64,
}
