//! # waypoint-geo
//!
//! Geolocation sampling for the waypoint client.
//!
//! - [`GeoProvider`]: the seam to the device's positioning hardware
//!   (permission request + single-fix acquisition).
//! - [`run_sampler`]: the repeating sampling loop — immediate first fix,
//!   fixed interval thereafter, per-tick timeout, deterministic
//!   cancellation. A failed fix is logged and the loop continues; only
//!   permission denial ends it.

#![deny(unsafe_code)]

pub mod provider;
pub mod sampler;

pub use provider::{GeoOptions, GeoProvider, Permission, SimulatedProvider};
pub use sampler::{SamplerConfig, SamplerOutcome, run_sampler};
