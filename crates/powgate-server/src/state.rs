//! Shared state for request handlers.

use std::sync::Arc;
use std::time::Instant;

use powgate_defense::{AdmissionController, DefenseMetrics, MetricsSnapshot};

use crate::config::ServerConfig;
use crate::workload::HandshakeWorkload;

/// State shared by every handler through `Arc`.
#[derive(Debug)]
pub struct ServerState {
    config: ServerConfig,
    controller: AdmissionController,
    workload: HandshakeWorkload,
    metrics: Arc<DefenseMetrics>,
    started_at: Instant,
}

impl ServerState {
    /// Build state from configuration with fresh counters.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self::with_metrics(config, Arc::new(DefenseMetrics::new()))
    }

    /// Build state that reports into existing counters.
    #[must_use]
    pub fn with_metrics(config: ServerConfig, metrics: Arc<DefenseMetrics>) -> Self {
        let controller = AdmissionController::new(&config.defense, Arc::clone(&metrics));
        let workload = HandshakeWorkload::new(config.workload_iterations);
        Self {
            config,
            controller,
            workload,
            metrics,
            started_at: Instant::now(),
        }
    }

    /// Server configuration.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Admission controller guarding the protected path.
    #[must_use]
    pub const fn controller(&self) -> &AdmissionController {
        &self.controller
    }

    /// The protected operation.
    #[must_use]
    pub const fn workload(&self) -> &HandshakeWorkload {
        &self.workload
    }

    /// Current counter values.
    #[must_use]
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Seconds since the state was created.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
