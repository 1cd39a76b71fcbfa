//! Command-line argument parsing with clap.

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::{AttackConfig, AttackMode, DEFAULT_TARGET_URL};

/// powgate attacker - flood a protected endpoint and report what got through.
#[derive(Parser, Debug, Clone)]
#[command(name = "powgate-attacker")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// URL of the protected endpoint.
    #[arg(short, long, env = "POWGATE_TARGET", default_value = DEFAULT_TARGET_URL)]
    pub target: String,

    /// Number of concurrent workers.
    #[arg(short, long, default_value_t = 10)]
    pub concurrency: usize,

    /// How workers react to a PoW challenge.
    #[arg(short, long, value_enum, default_value_t = AttackMode::Naive)]
    pub mode: AttackMode,

    /// Run time in seconds.
    #[arg(short, long = "duration", default_value_t = 10)]
    pub duration_secs: u64,

    /// Per-request timeout in milliseconds.
    #[arg(long = "timeout-ms", default_value_t = 5000)]
    pub timeout_ms: u64,

    /// Stop each worker after this many iterations.
    #[arg(long)]
    pub max_requests: Option<u64>,

    /// Summary output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Build the run configuration from parsed arguments.
    #[must_use]
    pub fn to_config(&self) -> AttackConfig {
        let config = AttackConfig::new(self.target.clone())
            .with_concurrency(self.concurrency)
            .with_mode(self.mode)
            .with_duration(Duration::from_secs(self.duration_secs))
            .with_request_timeout(Duration::from_millis(self.timeout_ms));

        match self.max_requests {
            Some(max) => config.with_max_requests_per_worker(max),
            None => config,
        }
    }
}
