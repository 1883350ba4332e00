//! # waypoint-core
//!
//! Foundation types for the waypoint real-time location client.
//!
//! This crate provides the shared vocabulary that all other waypoint crates
//! depend on:
//!
//! - **Coordinates**: validated [`Coordinate`] value type, [`CurrentLocation`]
//!   with [`Provenance`] tagging
//! - **Wire frames**: [`OutboundMessage`] and the [`parse_inbound`] boundary
//!   for server payloads
//! - **Errors**: [`GeoError`], [`SessionError`], [`FailureReason`] via `thiserror`
//! - **Backoff**: [`BackoffConfig`] and the reconnect delay math
//! - **Credentials**: the [`CredentialProvider`] seam to the external auth flow
//! - **Logging**: [`logging::init_subscriber`] for binaries

#![deny(unsafe_code)]

pub mod backoff;
pub mod coordinate;
pub mod credentials;
pub mod errors;
pub mod logging;
pub mod wire;

pub use backoff::{BackoffConfig, delay_for_attempt, delay_for_attempt_with_random};
pub use coordinate::{Coordinate, CurrentLocation, Provenance};
pub use credentials::{CredentialProvider, SessionCredential, StaticCredential};
pub use errors::{FailureReason, GeoError, SessionError};
pub use wire::{InboundMessage, OutboundMessage, parse_inbound};
