//! Transport session for live location sync.
//!
//! One [`SessionHandle`] owns one websocket lifecycle: connect,
//! authenticate, stream, reconnect with backoff, and terminal close or
//! failure. State is published on a watch channel; inbound locations flow
//! into a [`waypoint_tracker::Reconciler`].

#![deny(unsafe_code)]

pub mod session;
pub mod state;
pub mod transport;

pub use session::{SessionConfig, SessionHandle, start};
pub use state::{ConnectionState, SessionEvent};
pub use transport::{Transport, TransportConn, WsTransport};
