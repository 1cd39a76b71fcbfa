//! Per-client rate limiting using the token bucket algorithm.

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RateLimitConfig;

/// Opaque key identifying a request source, usually a peer IP address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    /// Create an identity from any string key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The underlying key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientIdentity {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ClientIdentity {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<std::net::IpAddr> for ClientIdentity {
    fn from(ip: std::net::IpAddr) -> Self {
        Self(ip.to_string())
    }
}

/// Token bucket state for a single client.
#[derive(Debug)]
struct TokenBucket {
    /// Current tokens available, kept within `[0, capacity]`.
    tokens: f64,
    /// Last time tokens were refilled.
    last_refill: Instant,
    /// Tokens added per second.
    rate: f64,
    /// Maximum tokens (burst size).
    capacity: f64,
}

impl TokenBucket {
    /// Create a full bucket.
    fn new(rate: f64, capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_refill: now,
            rate,
            capacity,
        }
    }

    /// Refill tokens for the time elapsed since the last refill.
    fn refill(&mut self, now: Instant) {
        // A clock reading earlier than `last_refill` adds nothing.
        let Some(elapsed) = now.checked_duration_since(self.last_refill) else {
            return;
        };

        let added = elapsed.as_secs_f64() * self.rate;
        self.tokens = (self.tokens + added).min(self.capacity);
        self.last_refill = now;
    }

    /// Refill, then take one token if there is one.
    fn try_take(&mut self, now: Instant) -> bool {
        self.refill(now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Tokens available at `now`.
    fn available(&mut self, now: Instant) -> f64 {
        self.refill(now);
        self.tokens
    }
}

/// Per-client token bucket limiter.
///
/// Buckets are created full on first sight of a client and are never
/// evicted, so memory grows with the number of distinct identities seen.
/// A bounded cache with idle eviction would be needed before facing
/// spoofed or rotating source addresses.
#[derive(Debug)]
pub struct TokenBucketLimiter {
    /// Tokens added per second.
    rate: f64,
    /// Bucket capacity.
    burst: u32,
    /// Buckets per client; one lock covers lookup and take.
    buckets: Mutex<HashMap<ClientIdentity, TokenBucket>>,
}

impl TokenBucketLimiter {
    /// Create a new limiter.
    #[must_use]
    pub fn new(tokens_per_second: f64, burst: u32) -> Self {
        Self {
            rate: tokens_per_second,
            burst,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Create from configuration.
    #[must_use]
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.tokens_per_second, config.burst)
    }

    /// Take one token for `client` if available. Never waits.
    pub fn allow(&self, client: &ClientIdentity) -> bool {
        self.allow_at(client, Instant::now())
    }

    /// Like [`allow`](Self::allow) with an explicit clock reading.
    pub fn allow_at(&self, client: &ClientIdentity, now: Instant) -> bool {
        let mut buckets = self.buckets.lock();

        let bucket = buckets
            .entry(client.clone())
            .or_insert_with(|| TokenBucket::new(self.rate, f64::from(self.burst), now));

        let allowed = bucket.try_take(now);
        debug!(client = %client, allowed, remaining = bucket.tokens, "Rate limit check");
        allowed
    }

    /// Tokens currently available to `client` (a full bucket if unseen).
    #[must_use]
    pub fn available(&self, client: &ClientIdentity) -> f64 {
        self.available_at(client, Instant::now())
    }

    /// Like [`available`](Self::available) with an explicit clock reading.
    #[must_use]
    pub fn available_at(&self, client: &ClientIdentity, now: Instant) -> f64 {
        self.buckets
            .lock()
            .get_mut(client)
            .map_or(f64::from(self.burst), |bucket| bucket.available(now))
    }

    /// Number of clients with a bucket.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.buckets.lock().len()
    }

    /// Tokens added per second.
    #[must_use]
    pub const fn rate(&self) -> f64 {
        self.rate
    }

    /// Bucket capacity.
    #[must_use]
    pub const fn burst(&self) -> u32 {
        self.burst
    }
}
