//! Error types for the admission layer.

use thiserror::Error;

/// Errors that can occur in defense operations.
#[derive(Debug, Error)]
pub enum DefenseError {
    /// The OS entropy source could not produce puzzle material.
    #[error("Entropy source unavailable: {0}")]
    Entropy(String),

    /// A client-supplied solution could not be parsed.
    #[error("Malformed PoW solution: {0}")]
    MalformedSolution(String),

    /// Difficulty outside the range the hash can express.
    #[error("Invalid difficulty {difficulty}: must be at most {max} bits")]
    InvalidDifficulty {
        /// The rejected difficulty.
        difficulty: u32,
        /// Largest accepted difficulty.
        max: u32,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for defense operations.
pub type DefenseResult<T> = Result<T, DefenseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_entropy() {
        let err = DefenseError::Entropy("getrandom failed".into());
        let msg = err.to_string();
        assert!(msg.contains("Entropy"));
        assert!(msg.contains("getrandom failed"));
    }

    #[test]
    fn test_error_display_malformed() {
        let err = DefenseError::MalformedSolution("missing ':' delimiter".into());
        assert!(err.to_string().contains("missing ':' delimiter"));
    }

    #[test]
    fn test_error_display_invalid_difficulty() {
        let err = DefenseError::InvalidDifficulty {
            difficulty: 300,
            max: 256,
        };
        let msg = err.to_string();
        assert!(msg.contains("300"));
        assert!(msg.contains("256"));
    }

    #[test]
    fn test_error_display_config() {
        let err = DefenseError::Config("rate must be finite".into());
        assert!(err.to_string().contains("rate must be finite"));
    }
}
