//! Request counters for the protected endpoint.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Process-wide admission counters.
///
/// Owned by whoever serves the endpoint and shared by `Arc`. Reads are
/// atomic per counter but not consistent across the pair.
#[derive(Debug, Default)]
pub struct DefenseMetrics {
    processed: AtomicU64,
    dropped: AtomicU64,
}

impl DefenseMetrics {
    /// Create zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a request that reached the protected operation.
    pub fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a request that was answered with a challenge.
    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Requests that reached the protected operation.
    #[must_use]
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Requests answered with a challenge.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Read both counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            processed: self.processed(),
            dropped: self.dropped(),
        }
    }
}

/// Point-in-time view of [`DefenseMetrics`], as served by `/metrics`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Requests that reached the protected operation.
    pub processed: u64,
    /// Requests answered with a challenge.
    pub dropped: u64,
}
