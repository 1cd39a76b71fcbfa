//! # powgate-server
//!
//! HTTP front for an expensive endpoint guarded by `powgate-defense`.
//!
//! ## API Endpoints
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/auth/webauthn/begin` | GET, POST | Protected handshake (path configurable) |
//! | `/metrics` | GET | `{processed, dropped}` counters |
//! | `/health` | GET | Liveness and uptime |
//!
//! A request to the protected path gets either `200 OK` with the handshake
//! body, or `428 Precondition Required` with `X-PoW-Challenge` and
//! `X-PoW-Difficulty` headers and a JSON challenge body. Clients answer by
//! resending with `X-PoW-Solution: <prefix>:<nonce>`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use powgate_server::{DefenseServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), powgate_server::ServerError> {
//!     let server = DefenseServer::new(ServerConfig::default())?;
//!     server.serve().await
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;
pub mod workload;

// Re-export main types
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::DefenseServer;
pub use state::ServerState;
pub use workload::{HandshakeResponse, HandshakeWorkload};
