//! Injected progress-tracking collaborator
//!
//! Build stages only emit counters and status strings; where they end up is
//! the caller's business. The parallel big-street pass notifies from multiple
//! workers, so implementations must tolerate monotonic, possibly out-of-order
//! updates.

use std::sync::atomic::{AtomicU64, Ordering};

pub trait ProgressTracker: Send + Sync {
    fn status(&self, _status: &str) {}
    fn set_total(&self, _total: u64) {}
    /// Absolute position, may arrive out of order from concurrent workers.
    fn update(&self, _at: u64) {}
    fn increment(&self) {}
}

/// Discards all notifications.
pub struct NoopProgress;

impl ProgressTracker for NoopProgress {}

/// Logs status lines via `tracing` and keeps monotonic counters.
#[derive(Default)]
pub struct LogProgress {
    total: AtomicU64,
    current: AtomicU64,
}

impl LogProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

impl ProgressTracker for LogProgress {
    fn status(&self, status: &str) {
        self.current.store(0, Ordering::Relaxed);
        tracing::info!(status);
    }

    fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
    }

    fn update(&self, at: u64) {
        self.current.fetch_max(at, Ordering::Relaxed);
    }

    fn increment(&self) {
        self.current.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_progress_out_of_order_updates() {
        let p = LogProgress::new();
        p.set_total(100);
        p.update(7);
        p.update(3); // late worker, must not regress
        assert_eq!(p.current(), 7);
        assert_eq!(p.total(), 100);
    }

    #[test]
    fn test_log_progress_increment() {
        let p = LogProgress::new();
        p.increment();
        p.increment();
        assert_eq!(p.current(), 2);
    }
}
