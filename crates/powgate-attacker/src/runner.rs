//! Worker pool driving an attack run.

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::AttackClient;
use crate::config::AttackConfig;
use crate::error::AttackResult;
use crate::stats::{AttackStats, AttackSummary};

/// Run an attack for `config.duration`, then report.
///
/// Adaptive solves in flight when the timer fires run to completion, so at
/// high difficulty the call can return well after `duration`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the HTTP client
/// cannot be built. Individual request failures are only counted.
pub async fn run_attack(config: AttackConfig) -> AttackResult<AttackSummary> {
    let shutdown = CancellationToken::new();
    let timer = {
        let shutdown = shutdown.clone();
        let duration = config.duration;
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            shutdown.cancel();
        })
    };

    let result = run_attack_until(config, shutdown).await;
    timer.abort();
    result
}

/// Run an attack until `shutdown` is cancelled or every worker hits its
/// request cap.
///
/// Workers check the token between iterations. An iteration already in
/// flight, including an adaptive solve, runs to completion, so the call
/// returns only after every worker has stopped.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the HTTP client
/// cannot be built.
pub async fn run_attack_until(
    config: AttackConfig,
    shutdown: CancellationToken,
) -> AttackResult<AttackSummary> {
    config.validate()?;
    let client = AttackClient::new(&config)?;
    let stats = Arc::new(AttackStats::new());

    info!(
        target_url = %client.target(),
        mode = %config.mode,
        concurrency = config.concurrency,
        duration = ?config.duration,
        "Starting attack"
    );

    let started = Instant::now();
    let mut workers = JoinSet::new();
    for worker_id in 0..config.concurrency {
        workers.spawn(worker_loop(
            worker_id,
            client.clone(),
            Arc::clone(&stats),
            shutdown.clone(),
            config.max_requests_per_worker,
        ));
    }

    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "Attack worker panicked");
        }
    }

    let summary = stats.summary(started.elapsed());
    info!(
        sent = summary.sent,
        admitted = summary.admitted,
        challenged = summary.challenged,
        solved = summary.solved,
        failures = summary.failures,
        elapsed = ?summary.elapsed,
        "Attack finished"
    );
    Ok(summary)
}

async fn worker_loop(
    worker_id: usize,
    client: AttackClient,
    stats: Arc<AttackStats>,
    shutdown: CancellationToken,
    max_requests: Option<u64>,
) {
    let mut iterations: u64 = 0;
    while !shutdown.is_cancelled() {
        if max_requests.is_some_and(|max| iterations >= max) {
            break;
        }
        let outcome = client.attack_once().await;
        stats.record(&outcome);
        iterations += 1;
    }
    debug!(worker_id, iterations, "Attack worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AttackError;

    #[tokio::test]
    async fn test_cancelled_token_sends_nothing() {
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let config = AttackConfig::new("http://127.0.0.1:9/auth/webauthn/begin").with_concurrency(4);
        let summary = run_attack_until(config, shutdown).await.unwrap();

        assert_eq!(summary, AttackSummary {
            elapsed: summary.elapsed,
            ..AttackSummary::default()
        });
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected_before_start() {
        let config = AttackConfig::default().with_concurrency(0);
        let result = run_attack(config).await;
        assert!(matches!(result, Err(AttackError::Config(_))));
    }

    #[tokio::test]
    async fn test_zero_request_cap_sends_nothing() {
        let config = AttackConfig::new("http://127.0.0.1:9/auth/webauthn/begin")
            .with_concurrency(2)
            .with_max_requests_per_worker(0);
        let summary = run_attack_until(config, CancellationToken::new()).await.unwrap();
        assert_eq!(summary.sent, 0);
    }
}
