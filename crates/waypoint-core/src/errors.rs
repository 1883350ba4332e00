//! Error hierarchy for the waypoint client.
//!
//! Two domains, matching where faults can occur:
//!
//! - [`GeoError`]: geolocation hardware failures. Recovered locally by the
//!   sampler; a failed fix never tears the session down.
//! - [`SessionError`]: transport session failures. Transport faults feed the
//!   reconnect path; configuration faults are terminal and become a
//!   [`FailureReason`] on the connection state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Geolocation sampling failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeoError {
    /// The user denied (or revoked) location permission.
    #[error("location permission denied")]
    PermissionDenied,

    /// The hardware could not produce a fix.
    #[error("position unavailable: {0}")]
    PositionUnavailable(String),

    /// The fix did not arrive within the configured timeout.
    #[error("position request timed out")]
    Timeout,
}

impl GeoError {
    /// Whether the sampling loop should keep scheduling ticks after this
    /// error. Everything except permission denial is a transient fault.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::PermissionDenied)
    }
}

/// Transport session failure.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The credential provider yielded no token at session start.
    #[error("no session credential available")]
    NoCredential,

    /// The configured endpoint is not a websocket URL.
    #[error("malformed endpoint: {0}")]
    InvalidEndpoint(String),

    /// Connect, send, or receive failed at the transport level.
    #[error("transport error: {0}")]
    Transport(String),

    /// An inbound frame did not match any recognized shape.
    ///
    /// Caught at the parse boundary; never fatal to the session.
    #[error("malformed inbound frame: {0}")]
    MalformedFrame(String),

    /// The session driver is gone (stopped or panicked).
    #[error("session channel closed")]
    ChannelClosed,
}

impl SessionError {
    /// Whether the error should feed the reconnect path rather than
    /// terminate the session.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Why a session reached the terminal `Failed` state.
///
/// Only unrecoverable conditions appear here; transient transport faults
/// are absorbed by reconnection until the retry budget runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureReason {
    /// No bearer token was available at start.
    NoCredential,
    /// The endpoint was not a `ws://` / `wss://` URL.
    InvalidEndpoint,
    /// Every reconnect attempt in the budget failed.
    RetriesExhausted,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoCredential => f.write_str("no credential"),
            Self::InvalidEndpoint => f.write_str("invalid endpoint"),
            Self::RetriesExhausted => f.write_str("retries exhausted"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geo_recoverability() {
        assert!(!GeoError::PermissionDenied.is_recoverable());
        assert!(GeoError::Timeout.is_recoverable());
        assert!(GeoError::PositionUnavailable("no satellites".into()).is_recoverable());
    }

    #[test]
    fn session_retryability() {
        assert!(SessionError::Transport("connection reset".into()).is_retryable());
        assert!(!SessionError::NoCredential.is_retryable());
        assert!(!SessionError::InvalidEndpoint("http://x".into()).is_retryable());
        assert!(!SessionError::MalformedFrame("not json".into()).is_retryable());
    }

    #[test]
    fn failure_reason_display() {
        assert_eq!(FailureReason::NoCredential.to_string(), "no credential");
        assert_eq!(
            FailureReason::RetriesExhausted.to_string(),
            "retries exhausted"
        );
    }

    #[test]
    fn failure_reason_serde() {
        let json = serde_json::to_string(&FailureReason::RetriesExhausted).unwrap();
        assert_eq!(json, "\"retriesExhausted\"");
        let back: FailureReason = serde_json::from_str(&json).unwrap();
        assert_eq!(back, FailureReason::RetriesExhausted);
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            SessionError::NoCredential.to_string(),
            "no session credential available"
        );
        assert_eq!(GeoError::Timeout.to_string(), "position request timed out");
    }
}
