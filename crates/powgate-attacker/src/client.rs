//! One worker iteration against the protected endpoint.

use powgate_defense::{pow, Challenge, Solution, HASH_BITS, SOLUTION_HEADER};
use reqwest::{Response, StatusCode, Url};
use tracing::{debug, warn};

use crate::config::{AttackConfig, AttackMode};
use crate::error::{AttackError, AttackResult};
use crate::stats::{RequestOutcome, RetryResult};

/// HTTP client bound to one target and strategy.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct AttackClient {
    http: reqwest::Client,
    target: Url,
    mode: AttackMode,
}

impl AttackClient {
    /// Build a client from the run configuration.
    ///
    /// # Errors
    ///
    /// Returns `AttackError::Config` for a bad target and
    /// `AttackError::Client` if the HTTP client cannot be built.
    pub fn new(config: &AttackConfig) -> AttackResult<Self> {
        let target = config.target()?;
        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(config.request_timeout)
            .no_proxy()
            .build()
            .map_err(|e| AttackError::Client(e.to_string()))?;

        Ok(Self {
            http,
            target,
            mode: config.mode,
        })
    }

    /// The endpoint being attacked.
    #[must_use]
    pub fn target(&self) -> &Url {
        &self.target
    }

    /// The configured strategy.
    #[must_use]
    pub const fn mode(&self) -> AttackMode {
        self.mode
    }

    /// Send one request and, in adaptive mode, answer a challenge once.
    pub async fn attack_once(&self) -> RequestOutcome {
        let response = match self.send(None).await {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "Request failed");
                return RequestOutcome::TransportFailure;
            }
        };

        match response.status() {
            StatusCode::OK => {
                if drain(response).await {
                    RequestOutcome::Admitted
                } else {
                    RequestOutcome::TransportFailure
                }
            }
            StatusCode::PRECONDITION_REQUIRED => match self.mode {
                AttackMode::Naive => {
                    drain(response).await;
                    RequestOutcome::Challenged
                }
                AttackMode::Adaptive => self.solve_and_retry(response).await,
            },
            other => {
                debug!(status = other.as_u16(), "Unexpected status");
                drain(response).await;
                RequestOutcome::UnexpectedStatus(other.as_u16())
            }
        }
    }

    async fn solve_and_retry(&self, response: Response) -> RequestOutcome {
        let challenge: Challenge = match response.json().await {
            Ok(challenge) => challenge,
            Err(e) => {
                warn!(error = %e, "Unreadable challenge body");
                return RequestOutcome::SolveAbandoned;
            }
        };

        let difficulty = challenge.difficulty;
        if difficulty > HASH_BITS {
            warn!(difficulty, "Challenge difficulty cannot be met");
            return RequestOutcome::SolveAbandoned;
        }

        let prefix = challenge.puzzle.prefix;
        let solved = {
            let prefix = prefix.clone();
            match tokio::task::spawn_blocking(move || pow::solve(&prefix, difficulty)).await {
                Ok(solved) => solved,
                Err(e) => {
                    warn!(error = %e, "Solver task failed");
                    return RequestOutcome::SolveAbandoned;
                }
            }
        };
        let attempts = solved.attempts;
        debug!(difficulty, attempts, "Solved challenge");

        let solution = Solution {
            prefix,
            nonce: solved.nonce,
        };
        let retry = match self.send(Some(&solution)).await {
            Ok(response) if response.status() == StatusCode::OK => {
                if drain(response).await {
                    RetryResult::Admitted
                } else {
                    RetryResult::TransportFailure
                }
            }
            Ok(response) => {
                let status = response.status().as_u16();
                debug!(status, "Solution rejected");
                drain(response).await;
                RetryResult::Rejected(status)
            }
            Err(e) => {
                debug!(error = %e, "Retry failed");
                RetryResult::TransportFailure
            }
        };

        RequestOutcome::SolvedAndRetried { attempts, retry }
    }

    async fn send(&self, solution: Option<&Solution>) -> reqwest::Result<Response> {
        let mut request = self.http.post(self.target.clone());
        if let Some(solution) = solution {
            request = request.header(SOLUTION_HEADER, solution.to_string());
        }
        request.send().await
    }
}

/// Read the body to the end so the connection can be reused.
async fn drain(response: Response) -> bool {
    response.bytes().await.is_ok()
}
