//! Admission control for the protected endpoint.
//!
//! Each request ends in one of two terminal states:
//!
//! 1. **Admitted** – the client still has rate-limit tokens, or it attached
//!    a solution that meets the configured difficulty. A valid solution
//!    bypasses the limiter entirely.
//! 2. **Challenged** – neither of the above; the dropped counter is bumped
//!    and a fresh [`Puzzle`] goes back to the client.
//!
//! No state is carried between requests. The solution's prefix is not
//! checked against anything previously issued, so self-chosen or replayed
//! prefixes are accepted.

use std::sync::Arc;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::DefenseConfig;
use crate::error::DefenseResult;
use crate::metrics::DefenseMetrics;
use crate::pow::{self, Puzzle, Solution};
use crate::rate_limit::{ClientIdentity, TokenBucketLimiter};

/// Message carried in every challenge body.
pub const CHALLENGE_MESSAGE: &str = "Rate limit exceeded. Solve PoW.";

/// The expensive work guarded by the controller.
pub trait ProtectedOperation {
    /// Value produced by one invocation.
    type Output;

    /// Run the operation once.
    fn execute(&self) -> Self::Output;
}

/// Why a request was admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmitPath {
    /// The client had a rate-limit token.
    RateLimit,
    /// The client was over its limit but attached a valid solution.
    ProofOfWork,
}

/// Body of a challenge response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// Human-readable reason.
    pub error: String,
    /// The puzzle to solve.
    pub puzzle: Puzzle,
    /// Difficulty the server will verify against.
    pub difficulty: u32,
}

impl Challenge {
    /// Wrap a freshly minted puzzle.
    #[must_use]
    pub fn new(puzzle: Puzzle) -> Self {
        let difficulty = puzzle.difficulty;
        Self {
            error: CHALLENGE_MESSAGE.to_string(),
            puzzle,
            difficulty,
        }
    }
}

/// Decision for a single request, before any work is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Forward to the protected operation.
    Admitted(AdmitPath),
    /// Reject with a challenge.
    Challenged(Challenge),
}

impl Admission {
    /// Check if the request was admitted.
    #[must_use]
    pub const fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted(_))
    }
}

/// Decision plus, on admission, the protected operation's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionOutcome<T> {
    /// The operation ran.
    Admitted {
        /// Why the request was admitted.
        path: AdmitPath,
        /// What the operation returned.
        output: T,
    },
    /// The operation did not run.
    Challenged(Challenge),
}

/// Composes the per-client limiter and the puzzle engine.
#[derive(Debug)]
pub struct AdmissionController {
    limiter: TokenBucketLimiter,
    difficulty: u32,
    metrics: Arc<DefenseMetrics>,
}

impl AdmissionController {
    /// Create a controller that reports into `metrics`.
    #[must_use]
    pub fn new(config: &DefenseConfig, metrics: Arc<DefenseMetrics>) -> Self {
        Self {
            limiter: TokenBucketLimiter::from_config(&config.rate_limit),
            difficulty: config.pow.difficulty,
            metrics,
        }
    }

    /// Decide what to do with a request.
    ///
    /// `solution_header` is the raw `prefix:nonce` value, if the client sent
    /// one. Malformed values are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns `DefenseError::Entropy` if a challenge was due but no puzzle
    /// could be generated. The dropped counter has already been bumped.
    pub fn decide(
        &self,
        client: &ClientIdentity,
        solution_header: Option<&str>,
    ) -> DefenseResult<Admission> {
        self.decide_with_rng(client, solution_header, &mut OsRng)
    }

    /// Like [`decide`](Self::decide) with an explicit puzzle entropy source.
    ///
    /// # Errors
    ///
    /// Returns `DefenseError::Entropy` if `rng` fails.
    pub fn decide_with_rng<R: RngCore + ?Sized>(
        &self,
        client: &ClientIdentity,
        solution_header: Option<&str>,
        rng: &mut R,
    ) -> DefenseResult<Admission> {
        if self.limiter.allow(client) {
            return Ok(Admission::Admitted(AdmitPath::RateLimit));
        }

        if let Some(raw) = solution_header {
            match raw.parse::<Solution>() {
                Ok(solution) if solution.verify(self.difficulty) => {
                    debug!(client = %client, prefix = %solution.prefix, "Admitted by proof of work");
                    return Ok(Admission::Admitted(AdmitPath::ProofOfWork));
                }
                Ok(solution) => {
                    debug!(client = %client, prefix = %solution.prefix, "Solution below difficulty");
                }
                Err(e) => {
                    debug!(client = %client, error = %e, "Ignoring malformed solution");
                }
            }
        }

        self.metrics.record_dropped();

        let puzzle = pow::generate_puzzle_with(rng, self.difficulty).inspect_err(|e| {
            warn!(client = %client, error = %e, "Could not mint puzzle");
        })?;
        debug!(client = %client, prefix = %puzzle.prefix, "Challenging client");

        Ok(Admission::Challenged(Challenge::new(puzzle)))
    }

    /// Decide, and run `operation` exactly once if admitted.
    ///
    /// # Errors
    ///
    /// See [`decide`](Self::decide).
    pub fn handle<O: ProtectedOperation + ?Sized>(
        &self,
        client: &ClientIdentity,
        solution_header: Option<&str>,
        operation: &O,
    ) -> DefenseResult<AdmissionOutcome<O::Output>> {
        self.handle_with_rng(client, solution_header, operation, &mut OsRng)
    }

    /// Like [`handle`](Self::handle) with an explicit puzzle entropy source.
    ///
    /// # Errors
    ///
    /// Returns `DefenseError::Entropy` if `rng` fails.
    pub fn handle_with_rng<O, R>(
        &self,
        client: &ClientIdentity,
        solution_header: Option<&str>,
        operation: &O,
        rng: &mut R,
    ) -> DefenseResult<AdmissionOutcome<O::Output>>
    where
        O: ProtectedOperation + ?Sized,
        R: RngCore + ?Sized,
    {
        match self.decide_with_rng(client, solution_header, rng)? {
            Admission::Admitted(path) => {
                let output = operation.execute();
                self.metrics.record_processed();
                Ok(AdmissionOutcome::Admitted { path, output })
            }
            Admission::Challenged(challenge) => Ok(AdmissionOutcome::Challenged(challenge)),
        }
    }

    /// Difficulty solutions are verified against.
    #[must_use]
    pub const fn difficulty(&self) -> u32 {
        self.difficulty
    }

    /// The underlying limiter.
    #[must_use]
    pub const fn limiter(&self) -> &TokenBucketLimiter {
        &self.limiter
    }

    /// Shared counters.
    #[must_use]
    pub fn metrics(&self) -> &Arc<DefenseMetrics> {
        &self.metrics
    }
}
