//! Attack run configuration.

use std::fmt;
use std::time::Duration;

use clap::ValueEnum;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{AttackError, AttackResult};

/// Default target of an attack run.
pub const DEFAULT_TARGET_URL: &str = "http://localhost:8080/auth/webauthn/begin";

/// How workers react to a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackMode {
    /// Ignore challenges; every request is a fresh attempt.
    #[default]
    #[value(alias = "dumb")]
    Naive,
    /// Solve each challenge and retry once with the solution.
    #[value(alias = "smart")]
    Adaptive,
}

impl fmt::Display for AttackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Naive => f.write_str("naive"),
            Self::Adaptive => f.write_str("adaptive"),
        }
    }
}

/// Configuration for one attack run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackConfig {
    /// URL of the protected endpoint.
    pub target_url: String,
    /// Number of concurrent workers.
    pub concurrency: usize,
    /// Challenge strategy.
    pub mode: AttackMode,
    /// How long workers keep issuing requests.
    pub duration: Duration,
    /// Deadline for each outbound request.
    pub request_timeout: Duration,
    /// Optional cap on iterations per worker.
    pub max_requests_per_worker: Option<u64>,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            target_url: DEFAULT_TARGET_URL.to_string(),
            concurrency: 10,
            mode: AttackMode::Naive,
            duration: Duration::from_secs(10),
            request_timeout: Duration::from_secs(5),
            max_requests_per_worker: None,
        }
    }
}

impl AttackConfig {
    /// Create a configuration against `target_url` with defaults otherwise.
    #[must_use]
    pub fn new(target_url: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            ..Self::default()
        }
    }

    /// Set the worker count.
    #[must_use]
    pub const fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the challenge strategy.
    #[must_use]
    pub const fn with_mode(mut self, mode: AttackMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the run duration.
    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set the per-request deadline.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Cap the iterations each worker performs.
    #[must_use]
    pub const fn with_max_requests_per_worker(mut self, max: u64) -> Self {
        self.max_requests_per_worker = Some(max);
        self
    }

    /// Parse and check the target URL.
    ///
    /// # Errors
    ///
    /// Returns `AttackError::Config` unless the URL is absolute http or https.
    /// TLS targets are served by the client's rustls backend.
    pub fn target(&self) -> AttackResult<Url> {
        let url = Url::parse(&self.target_url)
            .map_err(|e| AttackError::Config(format!("invalid target {:?}: {e}", self.target_url)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(AttackError::Config(format!(
                "unsupported target scheme {other:?}"
            ))),
        }
    }

    /// Check the configuration before starting a run.
    ///
    /// # Errors
    ///
    /// Returns `AttackError::Config` describing the first invalid field.
    pub fn validate(&self) -> AttackResult<()> {
        if self.concurrency == 0 {
            return Err(AttackError::Config("concurrency must be at least 1".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(AttackError::Config("request timeout must be non-zero".into()));
        }
        self.target()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_default_config() {
        let config = AttackConfig::default();
        assert_eq!(config.target_url, DEFAULT_TARGET_URL);
        assert_eq!(config.concurrency, 10);
        assert_eq!(config.mode, AttackMode::Naive);
        assert_eq!(config.duration, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert!(config.max_requests_per_worker.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = AttackConfig::new("http://127.0.0.1:9/x")
            .with_concurrency(3)
            .with_mode(AttackMode::Adaptive)
            .with_duration(Duration::from_millis(250))
            .with_request_timeout(Duration::from_secs(1))
            .with_max_requests_per_worker(7);

        assert_eq!(config.concurrency, 3);
        assert_eq!(config.mode, AttackMode::Adaptive);
        assert_eq!(config.max_requests_per_worker, Some(7));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = AttackConfig::default().with_concurrency(0);
        assert!(matches!(config.validate(), Err(AttackError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = AttackConfig::default().with_request_timeout(Duration::ZERO);
        assert!(matches!(config.validate(), Err(AttackError::Config(_))));
    }

    #[test_case("not a url" ; "garbage")]
    #[test_case("/auth/webauthn/begin" ; "relative")]
    #[test_case("ftp://localhost/begin" ; "wrong scheme")]
    fn test_validate_rejects_target(target: &str) {
        let config = AttackConfig::new(target);
        assert!(matches!(config.validate(), Err(AttackError::Config(_))));
    }

    #[test_case("http://127.0.0.1:8080/auth/webauthn/begin" ; "plain http")]
    #[test_case("https://gate.example.net/auth/webauthn/begin" ; "tls")]
    fn test_validate_accepts_target(target: &str) {
        assert!(AttackConfig::new(target).validate().is_ok());
    }

    #[test_case("naive", AttackMode::Naive)]
    #[test_case("dumb", AttackMode::Naive)]
    #[test_case("adaptive", AttackMode::Adaptive)]
    #[test_case("smart", AttackMode::Adaptive)]
    fn test_mode_parsing(raw: &str, expected: AttackMode) {
        assert_eq!(AttackMode::from_str(raw, true), Ok(expected));
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(AttackMode::Naive.to_string(), "naive");
        assert_eq!(AttackMode::Adaptive.to_string(), "adaptive");
    }
}
