//! Rate-limited error logging
//!
//! A run over a badly damaged input can reject millions of lines. Logging
//! each one would bury everything else, so rejections are logged at most
//! once per interval together with the number suppressed since the last
//! message.
//!
//! # Example
//!
//! ```ignore
//! use logfold_sinks::util::RateLimitedLogger;
//! use std::time::Duration;
//!
//! let logger = RateLimitedLogger::new(Duration::from_secs(10));
//!
//! for (line, err) in rejected {
//!     logger.rejected(line, &err, raw.as_bytes());
//! }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Default interval for rate-limited logging
pub const DEFAULT_LOG_INTERVAL: Duration = Duration::from_secs(10);

/// Maximum excerpt of offending input included in a log message
pub const MAX_DATA_LOG_LENGTH: usize = 256;

/// Logs rejected lines at most once per `min_interval`
///
/// Counters are atomics and the last log time sits behind a mutex, so one
/// logger can be shared.
pub struct RateLimitedLogger {
    /// Minimum interval between log messages
    min_interval: Duration,

    /// Last time we logged
    last_log_time: Mutex<Option<Instant>>,

    /// Errors since the last message
    pending: AtomicU64,

    /// Errors ever recorded
    total: AtomicU64,
}

impl RateLimitedLogger {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_log_time: Mutex::new(None),
            pending: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    /// Count one error; returns how many errors this message stands for
    /// (including suppressed ones) when it is time to log
    fn admit(&self) -> Option<u64> {
        self.pending.fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);

        let now = Instant::now();
        let mut last_time = self.last_log_time.lock();
        let due = match *last_time {
            None => true,
            Some(last) => now.duration_since(last) >= self.min_interval,
        };
        if !due {
            return None;
        }
        *last_time = Some(now);
        Some(self.pending.swap(0, Ordering::Relaxed))
    }

    /// Record a rejected input line, logging an excerpt of it
    ///
    /// The excerpt is cut to [`MAX_DATA_LOG_LENGTH`] bytes.
    pub fn rejected(&self, line: u64, error: &dyn std::fmt::Display, data: &[u8]) -> bool {
        let Some(count) = self.admit() else {
            return false;
        };
        tracing::error!(
            line,
            error = %error,
            data = %excerpt(data),
            suppressed_count = count - 1,
            total_rejected = self.total_error_count(),
            "rejected input line"
        );
        true
    }

    /// Errors recorded since the last message
    pub fn pending_error_count(&self) -> u64 {
        self.pending.load(Ordering::Relaxed)
    }

    pub fn total_error_count(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

impl Default for RateLimitedLogger {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_INTERVAL)
    }
}

fn excerpt(data: &[u8]) -> String {
    if data.len() > MAX_DATA_LOG_LENGTH {
        format!(
            "{}... (truncated from {} bytes)",
            String::from_utf8_lossy(&data[..MAX_DATA_LOG_LENGTH]),
            data.len()
        )
    } else {
        String::from_utf8_lossy(data).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_default_interval() {
        let logger = RateLimitedLogger::default();
        assert_eq!(logger.min_interval, DEFAULT_LOG_INTERVAL);
        assert_eq!(logger.total_error_count(), 0);
    }

    #[test]
    fn test_first_rejection_always_logs() {
        let logger = RateLimitedLogger::new(Duration::from_secs(10));
        let error = io::Error::other("expected value at line 1 column 1");

        assert!(logger.rejected(7, &error, b"[2021-03-04 11:00:00 ~ SDK ~ 0] {"));
        assert_eq!(logger.total_error_count(), 1);
        assert_eq!(logger.pending_error_count(), 0);
    }

    #[test]
    fn test_rapid_rejections_suppressed() {
        let logger = RateLimitedLogger::new(Duration::from_secs(10));
        let error = io::Error::other("bad line");

        assert!(logger.rejected(1, &error, b"{"));
        for line in 2..12 {
            assert!(!logger.rejected(line, &error, b"{"));
        }

        assert_eq!(logger.total_error_count(), 11);
        assert_eq!(logger.pending_error_count(), 10);
    }

    #[test]
    fn test_zero_interval_logs_everything() {
        let logger = RateLimitedLogger::new(Duration::ZERO);
        let error = io::Error::other("bad line");

        for line in 0..5 {
            assert!(logger.rejected(line, &error, b""));
        }
        assert_eq!(logger.pending_error_count(), 0);
    }

    #[test]
    fn test_excerpt_truncation() {
        let long = vec![b'x'; MAX_DATA_LOG_LENGTH + 100];
        let text = excerpt(&long);

        assert!(text.starts_with(&"x".repeat(MAX_DATA_LOG_LENGTH)));
        assert!(text.ends_with("(truncated from 356 bytes)"));
        assert_eq!(excerpt(b"short"), "short");
    }
}
