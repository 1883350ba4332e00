//! # waypoint-tracker
//!
//! Owns the single authoritative displayable location.
//!
//! - [`Reconciler`]: merges locally sampled and server-pushed coordinates
//!   into one `CurrentLocation` cell, last-write-wins.
//! - [`LocationFeed`]: the read-only view binding the map widget consumes;
//!   push-driven by reconciler updates, never polled.

#![deny(unsafe_code)]

pub mod feed;
pub mod reconciler;

pub use feed::LocationFeed;
pub use reconciler::Reconciler;
