//! Reconnect budget configuration and backoff calculation.
//!
//! Provides the types and math for the session's reconnect loop. The actual
//! async waiting lives in `waypoint-session` (which has access to tokio);
//! this module contains the portable, sync-only building blocks:
//!
//! - [`BackoffConfig`]: reconnect parameters (attempt budget, backoff, jitter)
//! - [`delay_for_attempt`]: exponential backoff without randomness
//! - [`delay_for_attempt_with_random`]: exponential backoff with caller-supplied jitter

use serde::{Deserialize, Serialize};

/// Default maximum consecutive reconnect attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// Default base delay in milliseconds.
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;
/// Default maximum delay in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;
/// Default jitter factor (0.0–1.0).
pub const DEFAULT_JITTER_FACTOR: f64 = 0.2;

/// Configuration for the reconnect budget.
///
/// The budget is bounded: after `max_attempts` consecutive failures the
/// session fails terminally instead of reconnecting forever.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackoffConfig {
    /// Maximum consecutive failed attempts before giving up (default: 5).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base delay for exponential backoff in ms (default: 1000).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Maximum delay between attempts in ms (default: 30000).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Jitter factor 0.0–1.0 (default: 0.2).
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}
fn default_base_delay_ms() -> u64 {
    DEFAULT_BASE_DELAY_MS
}
fn default_max_delay_ms() -> u64 {
    DEFAULT_MAX_DELAY_MS
}
fn default_jitter_factor() -> f64 {
    DEFAULT_JITTER_FACTOR
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            jitter_factor: DEFAULT_JITTER_FACTOR,
        }
    }
}

impl BackoffConfig {
    /// Whether the budget still allows another attempt.
    ///
    /// `attempt` is the zero-based index of the attempt about to be made.
    #[must_use]
    pub fn allows(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Calculate exponential backoff delay without randomness.
///
/// Formula: `min(max_delay, base_delay * 2^attempt)` with `attempt`
/// zero-based (0 for the first retry).
#[must_use]
pub fn delay_for_attempt(attempt: u32, base_delay_ms: u64, max_delay_ms: u64) -> u64 {
    base_delay_ms
        .saturating_mul(1u64 << attempt.min(31))
        .min(max_delay_ms)
}

/// Calculate backoff delay with explicit randomness.
///
/// `random` should be a value in `[0.0, 1.0)` from a PRNG. Jitter is
/// symmetric: a factor of 0.2 varies the delay ±20% around the capped
/// exponential value.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn delay_for_attempt_with_random(
    attempt: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
    jitter_factor: f64,
    random: f64,
) -> u64 {
    let capped = delay_for_attempt(attempt, base_delay_ms, max_delay_ms);

    // Maps random [0,1) to [-jitter, +jitter]
    let jitter = 1.0 + (random * 2.0 - 1.0) * jitter_factor;
    let with_jitter = (capped as f64) * jitter;

    with_jitter.round().max(0.0) as u64
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
