//! # powgate-defense
//!
//! Admission control for an expensive endpoint: a cheap per-client rate
//! limiter with a proof-of-work step-up once the limiter says no.
//!
//! ## Components
//!
//! - [`pow`] - Puzzle generation, stateless verification, brute-force solving
//! - [`TokenBucketLimiter`] - Per-client token buckets
//! - [`AdmissionController`] - Per-request admit / challenge decision
//! - [`DefenseMetrics`] - Processed and dropped request counters
//!
//! ## Protocol
//!
//! A client within its rate limit is admitted. Once over it, the client is
//! answered with a [`Puzzle`]: find a nonce such that
//! `SHA-256(prefix ‖ nonce)` has `difficulty` leading zero bits, then resend
//! the request with `prefix:nonce` attached. A valid solution is admitted
//! regardless of the limiter.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use powgate_defense::{
//!     AdmissionController, AdmissionOutcome, ClientIdentity, DefenseConfig, DefenseMetrics,
//!     ProtectedOperation, Solution,
//! };
//!
//! struct Handshake;
//!
//! impl ProtectedOperation for Handshake {
//!     type Output = &'static str;
//!
//!     fn execute(&self) -> Self::Output {
//!         "handshake started"
//!     }
//! }
//!
//! let config = DefenseConfig::builder().burst(1).difficulty(4).build();
//! let controller = AdmissionController::new(&config, Arc::new(DefenseMetrics::new()));
//! let client = ClientIdentity::new("203.0.113.9");
//!
//! // The first request uses the only token.
//! assert!(matches!(
//!     controller.handle(&client, None, &Handshake),
//!     Ok(AdmissionOutcome::Admitted { .. })
//! ));
//!
//! // The second is challenged; solving the puzzle gets it through.
//! if let Ok(AdmissionOutcome::Challenged(challenge)) = controller.handle(&client, None, &Handshake) {
//!     let solution = Solution::from((&challenge.puzzle, challenge.puzzle.solve()));
//!     let header = solution.to_string();
//!     assert!(matches!(
//!         controller.handle(&client, Some(header.as_str()), &Handshake),
//!         Ok(AdmissionOutcome::Admitted { .. })
//!     ));
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod admission;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pow;
pub mod rate_limit;

#[cfg(test)]
mod testing;

// Re-export main types
pub use admission::{
    Admission, AdmissionController, AdmissionOutcome, AdmitPath, Challenge, ProtectedOperation,
    CHALLENGE_MESSAGE,
};
pub use config::{DefenseConfig, DefenseConfigBuilder, PowConfig, RateLimitConfig};
pub use error::{DefenseError, DefenseResult};
pub use metrics::{DefenseMetrics, MetricsSnapshot};
pub use pow::{Puzzle, Solution, SolvedPuzzle, HASH_BITS};
pub use rate_limit::{ClientIdentity, TokenBucketLimiter};

/// Header carrying a client's `prefix:nonce` solution.
pub const SOLUTION_HEADER: &str = "X-PoW-Solution";

/// Header carrying the puzzle prefix on a challenge.
pub const CHALLENGE_HEADER: &str = "X-PoW-Challenge";

/// Header carrying the puzzle difficulty, in decimal, on a challenge.
pub const DIFFICULTY_HEADER: &str = "X-PoW-Difficulty";

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::admission::{AdmissionController, AdmissionOutcome, AdmitPath, Challenge, ProtectedOperation};
    pub use crate::config::DefenseConfig;
    pub use crate::error::{DefenseError, DefenseResult};
    pub use crate::metrics::{DefenseMetrics, MetricsSnapshot};
    pub use crate::pow::{Puzzle, Solution};
    pub use crate::rate_limit::{ClientIdentity, TokenBucketLimiter};
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Noop;

    impl ProtectedOperation for Noop {
        type Output = ();

        fn execute(&self) -> Self::Output {}
    }

    #[test]
    fn test_six_instant_requests_from_one_client() {
        let config = DefenseConfig::builder()
            .tokens_per_second(1.0)
            .burst(5)
            .difficulty(8)
            .build();
        let controller = AdmissionController::new(&config, Arc::new(DefenseMetrics::new()));
        let client = ClientIdentity::new("10.1.1.1");

        let admitted: Vec<bool> = (0..6)
            .map(|_| {
                matches!(
                    controller.handle(&client, None, &Noop),
                    Ok(AdmissionOutcome::Admitted { .. })
                )
            })
            .collect();

        assert_eq!(admitted, vec![true, true, true, true, true, false]);
    }

    #[test]
    fn test_metrics_shared_with_caller() {
        let metrics = Arc::new(DefenseMetrics::new());
        let config = DefenseConfig::builder().burst(1).build();
        let controller = AdmissionController::new(&config, Arc::clone(&metrics));
        let client = ClientIdentity::new("10.1.1.2");

        let _ = controller.handle(&client, None, &Noop);
        let _ = controller.handle(&client, None, &Noop);

        assert_eq!(metrics.snapshot(), MetricsSnapshot { processed: 1, dropped: 1 });
    }
}
