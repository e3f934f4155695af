//! Stream configuration and metrics

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::line_buffer::MAX_LINE_BYTES;

/// Stream client configuration
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// TCP/TLS connect timeout. The stream itself is long-lived and has no
    /// overall request timeout.
    pub connect_timeout: Duration,

    /// Longest accepted line, in bytes
    pub max_line_bytes: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            max_line_bytes: MAX_LINE_BYTES,
        }
    }
}

/// Stream metrics
#[derive(Debug, Default)]
pub struct StreamMetrics {
    /// Total bytes read from the connection
    pub bytes_read: AtomicU64,

    /// Total lines split from the byte stream
    pub lines_read: AtomicU64,

    /// (kind, data) pairs produced by the parser
    pub events_parsed: AtomicU64,

    /// Pairs whose JSON body failed to decode
    pub decode_failures: AtomicU64,
}

impl StreamMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a chunk read from the connection
    pub fn record_bytes(&self, n: usize) {
        self.bytes_read.fetch_add(n as u64, Ordering::Relaxed);
    }

    /// Record line split
    pub fn record_line(&self) {
        self.lines_read.fetch_add(1, Ordering::Relaxed);
    }

    /// Record parsed event
    pub fn record_event(&self) {
        self.events_parsed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record decode failure
    pub fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> StreamMetricsSnapshot {
        StreamMetricsSnapshot {
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            lines_read: self.lines_read.load(Ordering::Relaxed),
            events_parsed: self.events_parsed.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamMetricsSnapshot {
    /// Total bytes read from the connection
    pub bytes_read: u64,

    /// Total lines split from the byte stream
    pub lines_read: u64,

    /// (kind, data) pairs produced by the parser
    pub events_parsed: u64,

    /// Pairs whose JSON body failed to decode
    pub decode_failures: u64,
}
