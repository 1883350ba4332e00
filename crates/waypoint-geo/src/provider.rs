//! Positioning hardware seam.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use waypoint_core::{Coordinate, GeoError};

/// Result of a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// The user granted location access.
    Granted,
    /// The user denied location access.
    Denied,
}

/// Options for a single position request.
#[derive(Debug, Clone, Copy)]
pub struct GeoOptions {
    /// Prefer GPS over network positioning.
    pub high_accuracy: bool,
    /// How long a single fix may take before it fails with `Timeout`.
    pub timeout: Duration,
    /// Maximum acceptable age of a cached fix (zero forces a fresh one).
    pub max_age: Duration,
}

impl Default for GeoOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_millis(10_000),
            max_age: Duration::ZERO,
        }
    }
}

/// Access to the device's positioning hardware.
///
/// Implemented by the host platform; the sampler only ever talks to this
/// trait, so tests (and the CLI harness) can substitute scripted providers.
#[async_trait]
pub trait GeoProvider: Send + Sync {
    /// Ask the user for location permission.
    async fn request_permission(&self) -> Permission;

    /// Acquire one fix.
    ///
    /// Implementations should honor `options.timeout` where they can; the
    /// sampler additionally enforces it from the outside.
    async fn current_position(&self, options: &GeoOptions) -> Result<Coordinate, GeoError>;
}

/// A provider that walks randomly around a start coordinate.
///
/// Stands in for real GPS hardware in the CLI harness: each fix moves up to
/// `step_degrees` in each axis from the previous one, clamped to valid
/// coordinate ranges.
pub struct SimulatedProvider {
    state: Mutex<SimState>,
    step_degrees: f64,
}

struct SimState {
    position: Coordinate,
    rng: SmallRng,
}

impl SimulatedProvider {
    /// Create a provider starting at the given coordinate.
    #[must_use]
    pub fn new(start: Coordinate, step_degrees: f64) -> Self {
        Self {
            state: Mutex::new(SimState {
                position: start,
                rng: SmallRng::from_os_rng(),
            }),
            step_degrees,
        }
    }
}

#[async_trait]
impl GeoProvider for SimulatedProvider {
    async fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    async fn current_position(&self, _options: &GeoOptions) -> Result<Coordinate, GeoError> {
        let mut state = self.state.lock();
        let dlat = state.rng.random_range(-self.step_degrees..=self.step_degrees);
        let dlon = state.rng.random_range(-self.step_degrees..=self.step_degrees);
        let lat = (state.position.latitude() + dlat).clamp(-90.0, 90.0);
        let lon = (state.position.longitude() + dlon).clamp(-180.0, 180.0);
        // Clamped values stay in range, so construction cannot fail.
        let next = Coordinate::new(lat, lon)
            .ok_or_else(|| GeoError::PositionUnavailable("simulated walk left range".into()))?;
        state.position = next;
        Ok(next)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_default_options() {
        let options = GeoOptions::default();
        assert!(options.high_accuracy);
        assert_eq!(options.timeout, Duration::from_millis(10_000));
        assert_eq!(options.max_age, Duration::ZERO);
    }

    #[tokio::test]
    async fn simulated_provider_grants_permission() {
        let start = Coordinate::new(37.78825, -122.4324).unwrap();
        let provider = SimulatedProvider::new(start, 0.001);
        assert_eq!(provider.request_permission().await, Permission::Granted);
    }

    #[tokio::test]
    async fn simulated_walk_stays_near_start() {
        let start = Coordinate::new(37.78825, -122.4324).unwrap();
        let provider = SimulatedProvider::new(start, 0.001);
        let options = GeoOptions::default();

        for _ in 0..50 {
            let fix = provider.current_position(&options).await.unwrap();
            assert!((fix.latitude() - start.latitude()).abs() < 0.1);
            assert!((fix.longitude() - start.longitude()).abs() < 0.1);
        }
    }

    #[tokio::test]
    async fn simulated_walk_clamps_at_poles() {
        let start = Coordinate::new(90.0, 180.0).unwrap();
        let provider = SimulatedProvider::new(start, 1.0);
        let options = GeoOptions::default();

        for _ in 0..20 {
            // Every fix must still be a valid coordinate.
            let fix = provider.current_position(&options).await.unwrap();
            assert!(fix.latitude() <= 90.0);
            assert!(fix.longitude() <= 180.0);
        }
    }
}
