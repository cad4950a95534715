//! Pipeline metrics
//!
//! Atomic counters shared by the reader, the workers and the router.
//! All operations use relaxed ordering; values are eventually consistent.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters for one pipeline run
///
/// Safe to update from any thread. Read through [`PipelineMetrics::snapshot`].
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Non-blank lines handed to workers
    lines_read: AtomicU64,

    /// Blank lines skipped by the reader
    lines_skipped: AtomicU64,

    /// Lines transformed into records
    records_transformed: AtomicU64,

    /// Lines rejected in tolerant mode
    records_rejected: AtomicU64,

    /// Records appended to partition files
    records_written: AtomicU64,

    /// Total transform duration in nanoseconds
    transform_duration_ns: AtomicU64,
}

impl PipelineMetrics {
    #[inline]
    pub const fn new() -> Self {
        Self {
            lines_read: AtomicU64::new(0),
            lines_skipped: AtomicU64::new(0),
            records_transformed: AtomicU64::new(0),
            records_rejected: AtomicU64::new(0),
            records_written: AtomicU64::new(0),
            transform_duration_ns: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_line(&self) {
        self.lines_read.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_skipped(&self) {
        self.lines_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful transform and how long it took
    #[inline]
    pub fn record_transformed(&self, duration: Duration) {
        self.records_transformed.fetch_add(1, Ordering::Relaxed);
        self.transform_duration_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rejected(&self) {
        self.records_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_written(&self) {
        self.records_written.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn lines_read(&self) -> u64 {
        self.lines_read.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn records_written(&self) -> u64 {
        self.records_written.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of all counters
    #[inline]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lines_read: self.lines_read.load(Ordering::Relaxed),
            lines_skipped: self.lines_skipped.load(Ordering::Relaxed),
            records_transformed: self.records_transformed.load(Ordering::Relaxed),
            records_rejected: self.records_rejected.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            transform_duration_ns: self.transform_duration_ns.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of pipeline metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub lines_read: u64,
    pub lines_skipped: u64,
    pub records_transformed: u64,
    pub records_rejected: u64,
    pub records_written: u64,
    pub transform_duration_ns: u64,
}

impl MetricsSnapshot {
    /// Mean transform time per record
    ///
    /// Returns None if nothing has been transformed.
    #[inline]
    pub fn mean_transform_time(&self) -> Option<Duration> {
        if self.records_transformed == 0 {
            None
        } else {
            Some(Duration::from_nanos(
                self.transform_duration_ns / self.records_transformed,
            ))
        }
    }

    /// Difference from an earlier snapshot, for per-interval rates
    #[inline]
    pub fn diff(&self, previous: &MetricsSnapshot) -> MetricsSnapshot {
        MetricsSnapshot {
            lines_read: self.lines_read.saturating_sub(previous.lines_read),
            lines_skipped: self.lines_skipped.saturating_sub(previous.lines_skipped),
            records_transformed: self
                .records_transformed
                .saturating_sub(previous.records_transformed),
            records_rejected: self
                .records_rejected
                .saturating_sub(previous.records_rejected),
            records_written: self
                .records_written
                .saturating_sub(previous.records_written),
            transform_duration_ns: self
                .transform_duration_ns
                .saturating_sub(previous.transform_duration_ns),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        assert_eq!(PipelineMetrics::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_metrics_record() {
        let metrics = PipelineMetrics::new();

        metrics.record_line();
        metrics.record_line();
        metrics.record_line();
        metrics.record_skipped();
        metrics.record_transformed(Duration::from_micros(3));
        metrics.record_transformed(Duration::from_micros(5));
        metrics.record_rejected();
        metrics.record_written();
        metrics.record_written();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.lines_read, 3);
        assert_eq!(snapshot.lines_skipped, 1);
        assert_eq!(snapshot.records_transformed, 2);
        assert_eq!(snapshot.records_rejected, 1);
        assert_eq!(snapshot.records_written, 2);
        assert_eq!(snapshot.transform_duration_ns, 8_000);
        assert_eq!(metrics.lines_read(), 3);
        assert_eq!(metrics.records_written(), 2);
    }

    #[test]
    fn test_mean_transform_time() {
        assert_eq!(MetricsSnapshot::default().mean_transform_time(), None);

        let snapshot = MetricsSnapshot {
            records_transformed: 4,
            transform_duration_ns: 10_000,
            ..Default::default()
        };
        assert_eq!(
            snapshot.mean_transform_time(),
            Some(Duration::from_nanos(2_500))
        );
    }

    #[test]
    fn test_snapshot_diff() {
        let earlier = MetricsSnapshot {
            lines_read: 10,
            records_written: 8,
            records_rejected: 1,
            ..Default::default()
        };
        let later = MetricsSnapshot {
            lines_read: 25,
            records_written: 20,
            records_rejected: 1,
            ..Default::default()
        };

        let delta = later.diff(&earlier);
        assert_eq!(delta.lines_read, 15);
        assert_eq!(delta.records_written, 12);
        assert_eq!(delta.records_rejected, 0);

        // counters never run backwards, but diff must not underflow
        assert_eq!(earlier.diff(&later).lines_read, 0);
    }
}
