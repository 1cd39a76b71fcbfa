//! # powgate-attacker
//!
//! Load driver that floods a `powgate-server` endpoint to show how the
//! defense behaves under pressure.
//!
//! Two strategies:
//! - **naive** - fire requests as fast as possible and ignore `428` challenges
//! - **adaptive** - on a challenge, brute-force the puzzle and retry once
//!   with `X-PoW-Solution`
//!
//! ```text
//! worker ──POST──► protected endpoint
//!    ▲                 │
//!    │   200 / 428 ◄───┘
//!    └── (adaptive) solve prefix, resend with prefix:nonce
//! ```
//!
//! Workers run on a [`tokio::task::JoinSet`] and stop when a
//! [`tokio_util::sync::CancellationToken`] fires; see [`run_attack_until`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod runner;
pub mod stats;

pub use cli::{Cli, Format};
pub use client::AttackClient;
pub use config::{AttackConfig, AttackMode};
pub use error::{AttackError, AttackResult};
pub use runner::{run_attack, run_attack_until};
pub use stats::{AttackStats, AttackSummary, RequestOutcome, RetryResult};
