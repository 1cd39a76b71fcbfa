//! Admission layer configuration.

use serde::{Deserialize, Serialize};

use crate::error::{DefenseError, DefenseResult};
use crate::pow::{DEFAULT_DIFFICULTY, HASH_BITS};

/// Configuration for the per-client token bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Tokens added per second to each client's bucket.
    pub tokens_per_second: f64,
    /// Bucket capacity (requests allowed back to back).
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            tokens_per_second: 1.0,
            burst: 5,
        }
    }
}

/// Configuration for proof-of-work challenges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowConfig {
    /// Required leading zero bits in the solution hash.
    pub difficulty: u32,
}

impl Default for PowConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
        }
    }
}

/// Main defense configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefenseConfig {
    /// Rate limiting settings.
    pub rate_limit: RateLimitConfig,
    /// Proof-of-work settings.
    pub pow: PowConfig,
}

impl DefenseConfig {
    /// Create a new builder for defense configuration.
    #[must_use]
    pub fn builder() -> DefenseConfigBuilder {
        DefenseConfigBuilder::default()
    }

    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns `DefenseError::Config` for a negative or non-finite rate and
    /// `DefenseError::InvalidDifficulty` for a difficulty wider than the hash.
    pub fn validate(&self) -> DefenseResult<()> {
        let rate = self.rate_limit.tokens_per_second;
        if !rate.is_finite() || rate < 0.0 {
            return Err(DefenseError::Config(format!(
                "tokens_per_second must be a finite, non-negative number, got {rate}"
            )));
        }

        if self.pow.difficulty > HASH_BITS {
            return Err(DefenseError::InvalidDifficulty {
                difficulty: self.pow.difficulty,
                max: HASH_BITS,
            });
        }

        Ok(())
    }
}

/// Builder for `DefenseConfig`.
#[derive(Debug, Clone, Default)]
pub struct DefenseConfigBuilder {
    config: DefenseConfig,
}

impl DefenseConfigBuilder {
    /// Set the refill rate in tokens per second.
    #[must_use]
    pub const fn tokens_per_second(mut self, rate: f64) -> Self {
        self.config.rate_limit.tokens_per_second = rate;
        self
    }

    /// Set the bucket capacity.
    #[must_use]
    pub const fn burst(mut self, burst: u32) -> Self {
        self.config.rate_limit.burst = burst;
        self
    }

    /// Set the PoW difficulty in bits.
    #[must_use]
    pub const fn difficulty(mut self, difficulty: u32) -> Self {
        self.config.pow.difficulty = difficulty;
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> DefenseConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DefenseConfig::default();

        assert!((config.rate_limit.tokens_per_second - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.rate_limit.burst, 5);
        assert_eq!(config.pow.difficulty, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = DefenseConfig::builder()
            .tokens_per_second(10.0)
            .burst(3)
            .difficulty(8)
            .build();

        assert_eq!(config.rate_limit.burst, 3);
        assert_eq!(config.pow.difficulty, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_wide_difficulty() {
        let config = DefenseConfig::builder().difficulty(257).build();
        assert!(matches!(
            config.validate(),
            Err(DefenseError::InvalidDifficulty { difficulty: 257, max: 256 })
        ));

        let config = DefenseConfig::builder().difficulty(256).build();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_rate() {
        for rate in [f64::NAN, f64::INFINITY, -1.0] {
            let config = DefenseConfig::builder().tokens_per_second(rate).build();
            assert!(matches!(config.validate(), Err(DefenseError::Config(_))));
        }
    }

    #[test]
    fn test_config_json_roundtrip_shape() {
        let config = DefenseConfig::builder().burst(7).build();
        let json = serde_json::to_value(&config).unwrap();

        assert_eq!(json["rate_limit"]["burst"], 7);
        assert_eq!(json["pow"]["difficulty"], 20);
    }
}
