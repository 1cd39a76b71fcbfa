//! HTTP request handlers.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use powgate_defense::{
    AdmissionOutcome, Challenge, ClientIdentity, MetricsSnapshot, CHALLENGE_HEADER,
    DIFFICULTY_HEADER, SOLUTION_HEADER,
};
use serde::Serialize;

use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;

/// Identity used when the peer address is unknown.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status message.
    pub status: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
}

/// Handle GET /health.
pub async fn health_check(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.uptime_secs(),
    })
}

/// Handle GET /metrics - processed and dropped counters.
pub async fn get_metrics(State(state): State<Arc<ServerState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics_snapshot())
}

/// Handle the protected endpoint.
///
/// Admission and the handshake both burn CPU, so they run on the blocking
/// pool.
pub async fn begin_handshake(
    State(state): State<Arc<ServerState>>,
    request: Request,
) -> ServerResult<Response> {
    let client = client_identity(&request);
    let solution = request
        .headers()
        .get(SOLUTION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let worker_state = Arc::clone(&state);
    let outcome = tokio::task::spawn_blocking(move || {
        worker_state
            .controller()
            .handle(&client, solution.as_deref(), worker_state.workload())
    })
    .await
    .map_err(|e| ServerError::Internal(format!("admission task failed: {e}")))??;

    Ok(match outcome {
        AdmissionOutcome::Admitted { output, .. } => (StatusCode::OK, Json(output)).into_response(),
        AdmissionOutcome::Challenged(challenge) => challenge_response(challenge),
    })
}

/// Build a 428 response carrying the puzzle in headers and body.
pub fn challenge_response(challenge: Challenge) -> Response {
    let headers = [
        (CHALLENGE_HEADER, challenge.puzzle.prefix.clone()),
        (DIFFICULTY_HEADER, challenge.difficulty.to_string()),
    ];
    (StatusCode::PRECONDITION_REQUIRED, headers, Json(challenge)).into_response()
}

/// Rate-limit key for a request: the peer IP without its port.
pub fn client_identity(request: &Request) -> ClientIdentity {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(
            || ClientIdentity::new(UNKNOWN_CLIENT),
            |ConnectInfo(addr)| ClientIdentity::from(addr.ip()),
        )
}
