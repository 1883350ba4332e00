//! # waypoint-settings
//!
//! Configuration management with layered sources for the waypoint client.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`WaypointSettings::default()`]
//! 2. **User file** — `~/.waypoint/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `WAYPOINT_*` overrides (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use waypoint_settings::get_settings;
//!
//! let settings = get_settings();
//! println!("endpoint: {}", settings.session.endpoint);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::sync::OnceLock;

/// Global settings singleton.
///
/// Initialized on first access via [`get_settings`]. The settings are loaded
/// from `~/.waypoint/settings.json` with env var overrides, or fall back to
/// compiled defaults if loading fails.
static SETTINGS: OnceLock<WaypointSettings> = OnceLock::new();

/// Get the global settings instance.
///
/// On first call, loads settings from `~/.waypoint/settings.json` with env
/// var overrides. On subsequent calls, returns the cached value. If loading
/// fails, returns compiled defaults.
pub fn get_settings() -> &'static WaypointSettings {
    SETTINGS.get_or_init(|| load_settings().unwrap_or_default())
}

/// Initialize the global settings with a specific value.
///
/// # Errors
///
/// Returns the provided settings back if the global was already initialized.
pub fn init_settings(settings: WaypointSettings) -> std::result::Result<(), WaypointSettings> {
    SETTINGS.set(settings)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
