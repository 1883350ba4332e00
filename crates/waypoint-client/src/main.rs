//! # waypoint-client
//!
//! Terminal harness for the waypoint live-location stack: wires settings,
//! a (simulated) geolocation provider, the reconciler, and a websocket
//! session together, then prints every location change until ctrl-c or the
//! session reaches a terminal state.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use waypoint_core::logging::init_subscriber;
use waypoint_core::{Coordinate, OutboundMessage, StaticCredential};
use waypoint_geo::{GeoOptions, SamplerConfig, SamplerOutcome, SimulatedProvider, run_sampler};
use waypoint_session::{SessionConfig, WsTransport, start};
use waypoint_settings::{WaypointSettings, load_settings_from_path, settings_path};
use waypoint_tracker::Reconciler;

/// Waypoint live-location client.
#[derive(Parser, Debug)]
#[command(name = "waypoint", about = "Waypoint live-location client")]
struct Cli {
    /// Websocket endpoint (overrides settings).
    #[arg(long)]
    endpoint: Option<String>,

    /// Session token. Falls back to the WAYPOINT_TOKEN environment variable.
    #[arg(long)]
    token: Option<String>,

    /// Path to the settings file (defaults to `~/.waypoint/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log level when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Random-walk step of the simulated provider, in degrees per fix.
    #[arg(long, default_value = "0.0005")]
    step_degrees: f64,
}

fn load_settings(cli: &Cli) -> WaypointSettings {
    let path = cli.settings.clone().unwrap_or_else(settings_path);
    match load_settings_from_path(&path) {
        Ok(settings) => settings,
        Err(error) => {
            warn!(%error, path = %path.display(), "failed to load settings, using defaults");
            WaypointSettings::default()
        }
    }
}

fn session_config(settings: &WaypointSettings, cli: &Cli) -> SessionConfig {
    SessionConfig {
        endpoint: cli
            .endpoint
            .clone()
            .unwrap_or_else(|| settings.session.endpoint.clone()),
        connect_timeout: Duration::from_millis(settings.session.connect_timeout_ms),
        send_buffer_size: settings.session.send_buffer_size,
        retry: settings.session.retry.clone(),
    }
}

fn sampler_config(settings: &WaypointSettings) -> SamplerConfig {
    SamplerConfig {
        options: GeoOptions {
            high_accuracy: settings.sampler.high_accuracy,
            timeout: Duration::from_millis(settings.sampler.timeout_ms),
            max_age: Duration::from_millis(settings.sampler.max_age_ms),
        },
        interval: Duration::from_millis(settings.sampler.interval_ms),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_subscriber(&cli.log_level);

    let settings = load_settings(&cli);
    let default_location = Coordinate::new(
        settings.default_location.latitude,
        settings.default_location.longitude,
    )
    .context("default location in settings is out of range")?;

    let token = cli
        .token
        .clone()
        .or_else(|| std::env::var("WAYPOINT_TOKEN").ok());
    let credentials = Arc::new(match token {
        Some(token) => StaticCredential::new(token),
        None => StaticCredential::absent(),
    });

    let reconciler = Arc::new(Reconciler::new(default_location));
    let config = session_config(&settings, &cli);
    info!(endpoint = %config.endpoint, "starting session");
    let handle = Arc::new(start(
        Arc::new(WsTransport),
        credentials,
        reconciler.clone(),
        config,
    ));

    // Sampler: simulated GPS walking around the default location.
    let provider = Arc::new(SimulatedProvider::new(default_location, cli.step_degrees));
    let sampler_cancel = CancellationToken::new();
    let sampler_task = {
        let reconciler = reconciler.clone();
        let handle = handle.clone();
        let cancel = sampler_cancel.clone();
        tokio::spawn(run_sampler(
            provider,
            sampler_config(&settings),
            move |fix| {
                reconciler.apply_local(fix);
                let _ = handle.send(OutboundMessage::location(fix, Utc::now()));
            },
            cancel,
        ))
    };

    // Print every reconciled location change.
    let printer_task = {
        let mut feed = reconciler.subscribe();
        tokio::spawn(async move {
            while let Some(location) = feed.next_change().await {
                info!(
                    latitude = location.coordinate.latitude(),
                    longitude = location.coordinate.longitude(),
                    provenance = ?location.provenance,
                    "location updated"
                );
            }
        })
    };

    // Run until ctrl-c or the session reaches a terminal state.
    let mut state_rx = handle.watch_state();
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for ctrl-c")?;
            info!("shutdown requested");
        }
        () = async {
            while state_rx.changed().await.is_ok() {
                let state = *state_rx.borrow_and_update();
                info!(%state, "session state changed");
                if state.is_terminal() {
                    break;
                }
            }
        } => {
            warn!(state = %handle.state(), "session ended");
        }
    }

    sampler_cancel.cancel();
    handle.stop().await;
    if let Ok(SamplerOutcome::PermissionDenied) = sampler_task.await {
        warn!("location permission was denied");
    }
    printer_task.abort();

    info!(dropped = handle.dropped_messages(), "shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["waypoint"]);
        assert_eq!(cli.log_level, "info");
        assert!(cli.endpoint.is_none());
        assert!(cli.token.is_none());
        assert!((cli.step_degrees - 0.0005).abs() < f64::EPSILON);
    }

    #[test]
    fn cli_endpoint_override_wins() {
        let cli = Cli::parse_from(["waypoint", "--endpoint", "wss://live.example.com/track"]);
        let settings = WaypointSettings::default();
        let config = session_config(&settings, &cli);
        assert_eq!(config.endpoint, "wss://live.example.com/track");
    }

    #[test]
    fn session_config_comes_from_settings() {
        let cli = Cli::parse_from(["waypoint"]);
        let settings = WaypointSettings::default();
        let config = session_config(&settings, &cli);
        assert_eq!(config.endpoint, settings.session.endpoint);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.send_buffer_size, 64);
    }

    #[test]
    fn sampler_config_comes_from_settings() {
        let settings = WaypointSettings::default();
        let config = sampler_config(&settings);
        assert_eq!(config.interval, Duration::from_secs(30));
        assert!(config.options.high_accuracy);
        assert_eq!(config.options.max_age, Duration::ZERO);
    }
}
