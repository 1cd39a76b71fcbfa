//! Simulated expensive handshake behind the admission layer.

use powgate_defense::ProtectedOperation;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const SEED: &[u8] = b"simulate_heavy_load_for_webauthn_handshake";

/// Body returned when the handshake runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeResponse {
    /// Always `"success"`.
    pub status: String,
    /// Human-readable message.
    pub message: String,
}

/// Stands in for certificate parsing and signature checks by hashing
/// repeatedly.
#[derive(Debug, Clone, Copy)]
pub struct HandshakeWorkload {
    iterations: u32,
}

impl HandshakeWorkload {
    /// Create a workload that runs `iterations` chained SHA-256 rounds.
    #[must_use]
    pub const fn new(iterations: u32) -> Self {
        Self { iterations }
    }

    /// Rounds per invocation.
    #[must_use]
    pub const fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Run the hash chain and return the final digest.
    #[must_use]
    pub fn burn(&self) -> [u8; 32] {
        let mut state: [u8; 32] = Sha256::digest(SEED).into();
        for _ in 1..self.iterations {
            state = Sha256::digest(state).into();
        }
        state
    }
}

impl ProtectedOperation for HandshakeWorkload {
    type Output = HandshakeResponse;

    fn execute(&self) -> HandshakeResponse {
        let _ = std::hint::black_box(self.burn());
        HandshakeResponse {
            status: "success".to_string(),
            message: "WebAuthn challenge generated".to_string(),
        }
    }
}
