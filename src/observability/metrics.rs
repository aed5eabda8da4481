//! Execution metrics
//!
//! - Counters only, monotonic
//! - One registry per query context, shared by all of its cursors
//! - Thread-safe but lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters describing what a cursor tree did.
///
/// Relaxed ordering is enough: values are read after the tree is drained.
#[derive(Debug, Default)]
pub struct ExecutionMetrics {
    /// Successful `open` calls
    cursors_opened: AtomicU64,
    /// Rows handed to callers by `next`
    rows_produced: AtomicU64,
    /// Successful `destroy` calls
    cursors_destroyed: AtomicU64,
    /// Storage cursors repositioned for positional scans
    rebinds: AtomicU64,
    /// Table row-count reads
    row_count_reads: AtomicU64,
    /// Rows dropped because a limit was reached
    limits_reached: AtomicU64,
    /// `next` calls refused because the query was canceled
    cancellations: AtomicU64,
}

impl ExecutionMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_cursors_opened(&self) {
        self.cursors_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rows_produced(&self) {
        self.rows_produced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cursors_destroyed(&self) {
        self.cursors_destroyed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rebinds(&self) {
        self.rebinds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_row_count_reads(&self) {
        self.row_count_reads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_limits_reached(&self) {
        self.limits_reached.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cancellations(&self) {
        self.cancellations.fetch_add(1, Ordering::Relaxed);
    }

    /// Rows produced so far
    pub fn rows_produced(&self) -> u64 {
        self.rows_produced.load(Ordering::Relaxed)
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cursors_opened: self.cursors_opened.load(Ordering::Relaxed),
            rows_produced: self.rows_produced.load(Ordering::Relaxed),
            cursors_destroyed: self.cursors_destroyed.load(Ordering::Relaxed),
            rebinds: self.rebinds.load(Ordering::Relaxed),
            row_count_reads: self.row_count_reads.load(Ordering::Relaxed),
            limits_reached: self.limits_reached.load(Ordering::Relaxed),
            cancellations: self.cancellations.load(Ordering::Relaxed),
        }
    }

    /// Snapshot as a JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub cursors_opened: u64,
    pub rows_produced: u64,
    pub cursors_destroyed: u64,
    pub rebinds: u64,
    pub row_count_reads: u64,
    pub limits_reached: u64,
    pub cancellations: u64,
}
