//! Per-request outcomes and run-wide counters.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What happened to the retry sent after solving a puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryResult {
    /// The server accepted the solution.
    Admitted,
    /// The server answered with this status instead.
    Rejected(u16),
    /// The retry never got a response.
    TransportFailure,
}

/// Classification of one worker iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    /// First request got `200 OK`.
    Admitted,
    /// First request was challenged and the challenge was ignored.
    Challenged,
    /// Challenge solved and exactly one retry sent.
    SolvedAndRetried {
        /// Hashes spent finding the nonce.
        attempts: u64,
        /// How the retry went.
        retry: RetryResult,
    },
    /// Challenge received but not solvable (bad body or impossible
    /// difficulty); no retry was sent.
    SolveAbandoned,
    /// Connection refused, reset, or timed out.
    TransportFailure,
    /// Any other status code.
    UnexpectedStatus(u16),
}

/// Lock-free counters shared by all workers.
#[derive(Debug, Default)]
pub struct AttackStats {
    sent: AtomicU64,
    admitted: AtomicU64,
    challenged: AtomicU64,
    solved: AtomicU64,
    retry_admitted: AtomicU64,
    abandoned: AtomicU64,
    failures: AtomicU64,
    solve_attempts: AtomicU64,
}

impl AttackStats {
    /// Create zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one iteration's outcome into the counters.
    pub fn record(&self, outcome: &RequestOutcome) {
        let bump = |counter: &AtomicU64| {
            counter.fetch_add(1, Ordering::Relaxed);
        };

        bump(&self.sent);
        match *outcome {
            RequestOutcome::Admitted => bump(&self.admitted),
            RequestOutcome::Challenged => bump(&self.challenged),
            RequestOutcome::SolvedAndRetried { attempts, retry } => {
                bump(&self.challenged);
                bump(&self.solved);
                bump(&self.sent);
                self.solve_attempts.fetch_add(attempts, Ordering::Relaxed);
                match retry {
                    RetryResult::Admitted => {
                        bump(&self.admitted);
                        bump(&self.retry_admitted);
                    }
                    RetryResult::Rejected(_) | RetryResult::TransportFailure => {
                        bump(&self.failures);
                    }
                }
            }
            RequestOutcome::SolveAbandoned => {
                bump(&self.challenged);
                bump(&self.abandoned);
            }
            RequestOutcome::TransportFailure | RequestOutcome::UnexpectedStatus(_) => {
                bump(&self.failures);
            }
        }
    }

    /// Read every counter.
    #[must_use]
    pub fn summary(&self, elapsed: Duration) -> AttackSummary {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        AttackSummary {
            elapsed,
            sent: load(&self.sent),
            admitted: load(&self.admitted),
            challenged: load(&self.challenged),
            solved: load(&self.solved),
            retry_admitted: load(&self.retry_admitted),
            abandoned: load(&self.abandoned),
            failures: load(&self.failures),
            solve_attempts: load(&self.solve_attempts),
        }
    }
}

/// Final figures of an attack run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackSummary {
    /// Wall-clock run time.
    pub elapsed: Duration,
    /// Requests put on the wire, retries included.
    pub sent: u64,
    /// Requests that got `200 OK`, retries included.
    pub admitted: u64,
    /// Requests answered with a challenge.
    pub challenged: u64,
    /// Challenges solved and retried.
    pub solved: u64,
    /// Retries that got `200 OK`.
    pub retry_admitted: u64,
    /// Challenges that could not be solved.
    pub abandoned: u64,
    /// Transport failures, unexpected statuses, and rejected retries.
    pub failures: u64,
    /// Hashes spent across all solves.
    pub solve_attempts: u64,
}

impl AttackSummary {
    /// Admitted requests per second of run time.
    #[must_use]
    pub fn admitted_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.admitted as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for AttackSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<22} {:.2?}", "Duration", self.elapsed)?;
        writeln!(f, "{:<22} {}", "Requests sent", self.sent)?;
        writeln!(f, "{:<22} {}", "Admitted (200)", self.admitted)?;
        writeln!(f, "{:<22} {}", "Challenged (428)", self.challenged)?;
        writeln!(f, "{:<22} {}", "PoW solved", self.solved)?;
        writeln!(f, "{:<22} {}", "Admitted after solve", self.retry_admitted)?;
        writeln!(f, "{:<22} {}", "Solves abandoned", self.abandoned)?;
        writeln!(f, "{:<22} {}", "Hashes computed", self.solve_attempts)?;
        writeln!(f, "{:<22} {}", "Failures", self.failures)?;
        write!(f, "{:<22} {:.1}", "Admitted/sec", self.admitted_per_sec())
    }
}
