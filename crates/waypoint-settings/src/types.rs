//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` to match the mobile
//! client's JSON settings format. Each type implements [`Default`] with
//! production default values, and `#[serde(default)]` so partial JSON files
//! fill missing fields from the defaults.

use serde::{Deserialize, Serialize};

use waypoint_core::BackoffConfig;

/// Root settings type for the waypoint client.
///
/// Loaded from `~/.waypoint/settings.json` with defaults applied for
/// missing fields. Environment variables can override specific values.
///
/// # JSON Format
///
/// All field names are camelCase. Example:
///
/// ```json
/// {
///   "version": "0.1.0",
///   "session": { "endpoint": "wss://live.example.com/track" }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WaypointSettings {
    /// Settings schema version.
    pub version: String,
    /// Application name.
    pub name: String,
    /// The coordinate shown before any fix is accepted.
    pub default_location: DefaultLocationSettings,
    /// Geolocation sampling behavior.
    pub sampler: SamplerSettings,
    /// Transport session behavior.
    pub session: SessionSettings,
}

impl Default for WaypointSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            name: "waypoint".to_string(),
            default_location: DefaultLocationSettings::default(),
            sampler: SamplerSettings::default(),
            session: SessionSettings::default(),
        }
    }
}

/// The default map coordinate (used at startup and after teardown).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DefaultLocationSettings {
    /// Degrees latitude.
    pub latitude: f64,
    /// Degrees longitude.
    pub longitude: f64,
}

impl Default for DefaultLocationSettings {
    fn default() -> Self {
        // San Francisco, the stock startup coordinate.
        Self {
            latitude: 37.78825,
            longitude: -122.4324,
        }
    }
}

/// Geolocation sampling settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SamplerSettings {
    /// Prefer GPS over network positioning.
    pub high_accuracy: bool,
    /// Per-fix timeout in ms.
    pub timeout_ms: u64,
    /// Maximum acceptable cached-fix age in ms (0 forces fresh fixes).
    pub max_age_ms: u64,
    /// Time between fixes in ms.
    pub interval_ms: u64,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout_ms: 10_000,
            max_age_ms: 0,
            interval_ms: 30_000,
        }
    }
}

/// Transport session settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSettings {
    /// WebSocket endpoint of the location server.
    pub endpoint: String,
    /// Bounded connect timeout in ms.
    pub connect_timeout_ms: u64,
    /// Outbound send buffer capacity (messages beyond it are dropped).
    pub send_buffer_size: usize,
    /// Reconnect budget and backoff.
    pub retry: BackoffConfig,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            endpoint: "ws://127.0.0.1:8080/live".to_string(),
            connect_timeout_ms: 10_000,
            send_buffer_size: 64,
            retry: BackoffConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
