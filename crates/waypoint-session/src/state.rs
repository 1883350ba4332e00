//! The connection state machine.
//!
//! The lifecycle is a single pure transition function over discrete
//! [`SessionEvent`]s rather than ad-hoc on-open/on-message/on-close
//! callbacks, so every path through the machine is testable synchronously,
//! without a socket.

use std::fmt;

use waypoint_core::FailureReason;

/// Lifecycle state of one transport session.
///
/// Exactly one instance per session, owned by the driver task and published
/// on a watch channel. `Closed` and `Failed` are terminal: no event moves
/// the machine out of them, and the session object is never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Constructed, not yet started.
    Idle,
    /// Transport-level connect in flight (bounded by the connect timeout).
    Connecting,
    /// Connected; auth frame sent, waiting for the first well-formed
    /// inbound frame.
    Authenticating,
    /// Authenticated; location updates flow both ways.
    Streaming,
    /// Link lost; waiting out the backoff delay before reconnecting.
    Reconnecting,
    /// Client-initiated teardown. Terminal.
    Closed,
    /// Unrecoverable configuration error or exhausted retry budget. Terminal.
    Failed(FailureReason),
}

/// A discrete event fed into [`ConnectionState::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// `start()` was called with a usable credential and endpoint.
    StartRequested,
    /// The credential provider yielded no token.
    CredentialMissing,
    /// The endpoint is not a websocket URL.
    EndpointInvalid,
    /// Transport-level connect succeeded.
    ConnectSucceeded,
    /// Transport-level connect failed or timed out.
    ConnectFailed,
    /// A well-formed inbound frame arrived. While authenticating this
    /// doubles as the implicit auth confirmation (the server is not
    /// required to send an `authAck`). Malformed frames never raise
    /// this event.
    FrameReceived,
    /// The transport errored or closed without the client asking.
    TransportLost,
    /// The reconnect backoff delay elapsed.
    BackoffElapsed,
    /// Every attempt in the reconnect budget failed.
    RetriesExhausted,
    /// `stop()` was called.
    StopRequested,
}

impl ConnectionState {
    /// Pure transition function: the next state for an event.
    ///
    /// Terminal states absorb everything; events that make no sense in the
    /// current state leave it unchanged.
    #[must_use]
    pub fn apply(self, event: SessionEvent) -> Self {
        use ConnectionState::{
            Authenticating, Closed, Connecting, Failed, Idle, Reconnecting, Streaming,
        };
        use SessionEvent as E;

        match (self, event) {
            (state @ (Closed | Failed(_)), _) => state,
            (_, E::StopRequested) => Closed,
            (Idle, E::StartRequested) => Connecting,
            (Idle, E::CredentialMissing) => Failed(FailureReason::NoCredential),
            (Idle, E::EndpointInvalid) => Failed(FailureReason::InvalidEndpoint),
            (Connecting, E::ConnectSucceeded) => Authenticating,
            (Connecting, E::ConnectFailed) => Reconnecting,
            (Authenticating | Streaming, E::FrameReceived) => Streaming,
            (Authenticating | Streaming | Connecting, E::TransportLost) => Reconnecting,
            (Reconnecting, E::BackoffElapsed) => Connecting,
            (Reconnecting, E::RetriesExhausted) => Failed(FailureReason::RetriesExhausted),
            (state, _) => state,
        }
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Failed(_))
    }

    /// Whether outbound messages may be sent right now.
    ///
    /// Sends outside these states are best-effort and dropped, not queued.
    #[must_use]
    pub fn can_send(&self) -> bool {
        matches!(self, Self::Authenticating | Self::Streaming)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Connecting => f.write_str("connecting"),
            Self::Authenticating => f.write_str("authenticating"),
            Self::Streaming => f.write_str("streaming"),
            Self::Reconnecting => f.write_str("reconnecting"),
            Self::Closed => f.write_str("closed"),
            Self::Failed(reason) => write!(f, "failed ({reason})"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
