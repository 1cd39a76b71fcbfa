//! Route configuration.

use std::sync::Arc;

use axum::routing::{get, Router};
use tower_http::trace::TraceLayer;

use crate::handlers::{begin_handshake, get_metrics, health_check};
use crate::state::ServerState;

/// Create the server router.
///
/// The protected path accepts GET and POST; `/metrics` and `/health` are
/// never rate limited.
pub fn create_router(state: Arc<ServerState>) -> Router {
    let protected_path = state.config().protected_path.clone();

    Router::new()
        .route(&protected_path, get(begin_handshake).post(begin_handshake))
        .route("/metrics", get(get_metrics))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
