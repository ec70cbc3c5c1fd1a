//! Sink metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for a single sink, shareable across sessions
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Files staged for commit
    staged_count: AtomicU64,
    /// Files published by a commit
    committed_count: AtomicU64,
    /// Failed stage or commit attempts
    failure_count: AtomicU64,
    /// Published files removed after a partial commit
    rollback_count: AtomicU64,
}

impl SinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn staged_count(&self) -> u64 {
        self.staged_count.load(Ordering::Relaxed)
    }

    pub fn inc_staged(&self) {
        self.staged_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn committed_count(&self) -> u64 {
        self.committed_count.load(Ordering::Relaxed)
    }

    pub fn add_committed(&self, files: u64) {
        self.committed_count.fetch_add(files, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rollback_count(&self) -> u64 {
        self.rollback_count.load(Ordering::Relaxed)
    }

    pub fn add_rollback(&self, files: u64) {
        self.rollback_count.fetch_add(files, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            staged: self.staged_count(),
            committed: self.committed_count(),
            failures: self.failure_count(),
            rolled_back: self.rollback_count(),
        }
    }
}

/// Snapshot of sink metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub staged: u64,
    pub committed: u64,
    pub failures: u64,
    pub rolled_back: u64,
}
