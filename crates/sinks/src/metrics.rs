//! Sink metrics shared by every partition sink

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Partition files opened
    pub partitions_opened: AtomicU64,

    /// Rows written (header rows excluded)
    pub records_written: AtomicU64,

    /// Uncompressed bytes handed to chain writers by finalized sinks
    pub bytes_written: AtomicU64,

    /// Flushes of individual sinks
    pub flush_count: AtomicU64,

    /// Sinks finalized
    pub partitions_finalized: AtomicU64,
}

impl SinkMetrics {
    pub const fn new() -> Self {
        Self {
            partitions_opened: AtomicU64::new(0),
            records_written: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            flush_count: AtomicU64::new(0),
            partitions_finalized: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn partition_opened(&self) {
        self.partitions_opened.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_written(&self) {
        self.records_written.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn flushed(&self) {
        self.flush_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn partition_finalized(&self, bytes: u64) {
        self.partitions_finalized.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SinkMetricsSnapshot {
        SinkMetricsSnapshot {
            partitions_opened: self.partitions_opened.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            flush_count: self.flush_count.load(Ordering::Relaxed),
            partitions_finalized: self.partitions_finalized.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of sink metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkMetricsSnapshot {
    pub partitions_opened: u64,
    pub records_written: u64,
    pub bytes_written: u64,
    pub flush_count: u64,
    pub partitions_finalized: u64,
}
