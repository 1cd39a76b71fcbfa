//! Server configuration.

use std::net::SocketAddr;

use powgate_defense::DefenseConfig;

use crate::error::{ServerError, ServerResult};

/// Default path of the protected endpoint.
pub const DEFAULT_PROTECTED_PATH: &str = "/auth/webauthn/begin";

/// Default SHA-256 rounds burned per admitted request.
pub const DEFAULT_WORKLOAD_ITERATIONS: u32 = 100_000;

/// Configuration for the protected server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to.
    pub bind_addr: SocketAddr,
    /// Path of the protected endpoint.
    pub protected_path: String,
    /// Hash rounds performed by the simulated handshake.
    pub workload_iterations: u32,
    /// Rate limit and PoW settings.
    pub defense: DefenseConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            protected_path: DEFAULT_PROTECTED_PATH.to_string(),
            workload_iterations: DEFAULT_WORKLOAD_ITERATIONS,
            defense: DefenseConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new configuration with the specified bind address.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            ..Self::default()
        }
    }

    /// Set the defense settings.
    #[must_use]
    pub fn with_defense(mut self, defense: DefenseConfig) -> Self {
        self.defense = defense;
        self
    }

    /// Set the protected endpoint path.
    #[must_use]
    pub fn with_protected_path(mut self, path: impl Into<String>) -> Self {
        self.protected_path = path.into();
        self
    }

    /// Set the simulated workload size.
    #[must_use]
    pub const fn with_workload_iterations(mut self, iterations: u32) -> Self {
        self.workload_iterations = iterations;
        self
    }

    /// Check the configuration before serving.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` for an invalid path or defense setting.
    pub fn validate(&self) -> ServerResult<()> {
        if !self.protected_path.starts_with('/') {
            return Err(ServerError::Config(format!(
                "protected path must start with '/', got {:?}",
                self.protected_path
            )));
        }
        if self.protected_path == "/metrics" || self.protected_path == "/health" {
            return Err(ServerError::Config(format!(
                "protected path {} collides with a built-in route",
                self.protected_path
            )));
        }
        self.defense.validate()?;
        Ok(())
    }
}
