//! The repeating sampling loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use waypoint_core::{Coordinate, GeoError};

use crate::provider::{GeoOptions, GeoProvider, Permission};

/// Sampling loop configuration.
#[derive(Debug, Clone, Copy)]
pub struct SamplerConfig {
    /// Per-fix options handed to the provider.
    pub options: GeoOptions,
    /// Time between fixes (30 s by default).
    pub interval: Duration,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            options: GeoOptions::default(),
            interval: Duration::from_millis(30_000),
        }
    }
}

/// Why the sampling loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SamplerOutcome {
    /// The owning view unmounted (cancellation token fired).
    Cancelled,
    /// The user denied location permission, at start or mid-run.
    ///
    /// The UI should degrade to the default coordinate with a persistent,
    /// non-blocking notice rather than freeze on stale data.
    PermissionDenied,
}

/// Run the sampling loop until cancellation or permission denial.
///
/// Requests permission once, samples immediately, then on every `interval`
/// tick. Each successful fix is handed to `on_fix` (which forwards it to the
/// session for publishing and the reconciler as a local update) before the
/// next tick fires. A failed fix is logged and the loop continues; a single
/// missed GPS fix is never fatal.
///
/// Cancellation is deterministic: once the token fires, any in-flight
/// position request is abandoned and `on_fix` is never called again.
pub async fn run_sampler<F>(
    provider: Arc<dyn GeoProvider>,
    config: SamplerConfig,
    mut on_fix: F,
    cancel: CancellationToken,
) -> SamplerOutcome
where
    F: FnMut(Coordinate) + Send,
{
    let permission = tokio::select! {
        p = provider.request_permission() => p,
        () = cancel.cancelled() => return SamplerOutcome::Cancelled,
    };
    if permission == Permission::Denied {
        warn!("location permission denied, sampler not started");
        return SamplerOutcome::PermissionDenied;
    }

    // First tick completes immediately, so the first fix is sampled at start.
    let mut ticks = time::interval(config.interval);

    loop {
        tokio::select! {
            _ = ticks.tick() => {}
            () = cancel.cancelled() => return SamplerOutcome::Cancelled,
        }

        let result = tokio::select! {
            r = time::timeout(config.options.timeout, provider.current_position(&config.options)) => {
                r.map_err(|_| GeoError::Timeout).and_then(|inner| inner)
            }
            () = cancel.cancelled() => return SamplerOutcome::Cancelled,
        };

        match result {
            Ok(fix) => {
                if cancel.is_cancelled() {
                    return SamplerOutcome::Cancelled;
                }
                debug!(
                    latitude = fix.latitude(),
                    longitude = fix.longitude(),
                    "sampled position"
                );
                on_fix(fix);
            }
            Err(GeoError::PermissionDenied) => {
                warn!("location permission revoked, sampler stopping");
                return SamplerOutcome::PermissionDenied;
            }
            Err(error) => {
                // Transient fault; keep scheduling subsequent ticks.
                warn!(%error, "position fix failed, will retry next tick");
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
