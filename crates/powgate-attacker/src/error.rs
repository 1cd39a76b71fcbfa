//! Attacker error types.

use thiserror::Error;

/// Errors that stop an attack run before it starts.
///
/// Per-request failures are never errors; they are counted in
/// [`AttackStats`](crate::stats::AttackStats).
#[derive(Debug, Error)]
pub enum AttackError {
    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The HTTP client could not be built.
    #[error("client error: {0}")]
    Client(String),
}

/// Result type for attacker operations.
pub type AttackResult<T> = Result<T, AttackError>;
