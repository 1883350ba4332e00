//! Wire frames for the persistent location connection.
//!
//! All frames are JSON text. Outbound frames carry a `type` discriminator;
//! inbound location pushes do not (the server sends bare
//! `{latitude, longitude}` objects), so [`parse_inbound`] classifies by
//! shape. Anything unrecognized is a malformed frame: reported to the
//! caller for logging, never fatal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;
use crate::errors::SessionError;

/// A frame sent from client to server.
///
/// `Auth` is sent exactly once, immediately after transport connect.
/// `LocationUpdate` is sent for every accepted local fix while streaming.
/// The timestamp is in-memory provenance only and never serialized; the
/// wire shape is exactly `{"type":"locationUpdate","latitude":..,"longitude":..}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundMessage {
    /// Bearer-token authentication, first frame of every session.
    #[serde(rename = "auth")]
    Auth {
        /// Opaque bearer token from the external auth flow.
        token: String,
    },

    /// A locally sampled position.
    #[serde(rename = "locationUpdate")]
    LocationUpdate {
        /// Degrees latitude.
        latitude: f64,
        /// Degrees longitude.
        longitude: f64,
        /// When the fix was sampled (not sent on the wire).
        #[serde(skip, default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },
}

impl OutboundMessage {
    /// Build an auth frame.
    #[must_use]
    pub fn auth(token: impl Into<String>) -> Self {
        Self::Auth {
            token: token.into(),
        }
    }

    /// Build a location update from a validated coordinate.
    #[must_use]
    pub fn location(coordinate: Coordinate, timestamp: DateTime<Utc>) -> Self {
        Self::LocationUpdate {
            latitude: coordinate.latitude(),
            longitude: coordinate.longitude(),
            timestamp,
        }
    }

    /// Serialize to the JSON text frame.
    pub fn to_frame(&self) -> Result<String, SessionError> {
        serde_json::to_string(self).map_err(|e| SessionError::Transport(e.to_string()))
    }
}

/// A recognized frame received from the server.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InboundMessage {
    /// Explicit authentication confirmation (`{"type":"authAck"}`).
    AuthAck,
    /// A position push for the counterpart (or echoed self) location.
    Location(Coordinate),
}

/// Parse one inbound text frame.
///
/// Recognized shapes, in order:
/// 1. `{"type":"authAck", ...}` → [`InboundMessage::AuthAck`]
/// 2. any object with finite, in-range `latitude` and `longitude` numbers
///    → [`InboundMessage::Location`] (extra fields ignored)
///
/// Everything else — invalid JSON, missing fields, out-of-range values — is
/// a [`SessionError::MalformedFrame`]. Callers log it and keep streaming.
pub fn parse_inbound(text: &str) -> Result<InboundMessage, SessionError> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|_| SessionError::MalformedFrame(format!("invalid JSON: {text}")))?;

    if value.get("type").and_then(serde_json::Value::as_str) == Some("authAck") {
        return Ok(InboundMessage::AuthAck);
    }

    let latitude = value.get("latitude").and_then(serde_json::Value::as_f64);
    let longitude = value.get("longitude").and_then(serde_json::Value::as_f64);
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => Coordinate::new(lat, lon)
            .map(InboundMessage::Location)
            .ok_or_else(|| {
                SessionError::MalformedFrame(format!("coordinate out of range: {lat}, {lon}"))
            }),
        _ => Err(SessionError::MalformedFrame(format!(
            "unrecognized frame shape: {text}"
        ))),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn auth_frame_shape() {
        let frame = OutboundMessage::auth("tok1").to_frame().unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value, serde_json::json!({"type": "auth", "token": "tok1"}));
    }

    #[test]
    fn location_update_frame_shape() {
        let coord = Coordinate::new(37.78825, -122.4324).unwrap();
        let frame = OutboundMessage::location(coord, Utc::now())
            .to_frame()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        // The timestamp must not leak onto the wire.
        assert_eq!(
            value,
            serde_json::json!({
                "type": "locationUpdate",
                "latitude": 37.78825,
                "longitude": -122.4324,
            })
        );
    }

    #[test]
    fn parse_bare_location_push() {
        let msg = parse_inbound(r#"{"latitude":40.0,"longitude":-73.0}"#).unwrap();
        assert_matches!(msg, InboundMessage::Location(c) => {
            assert!((c.latitude() - 40.0).abs() < f64::EPSILON);
            assert!((c.longitude() - -73.0).abs() < f64::EPSILON);
        });
    }

    #[test]
    fn parse_location_with_extra_fields() {
        let msg =
            parse_inbound(r#"{"latitude":40.0,"longitude":-73.0,"accuracy":5.0,"id":"peer"}"#)
                .unwrap();
        assert_matches!(msg, InboundMessage::Location(_));
    }

    #[test]
    fn parse_auth_ack() {
        assert_eq!(
            parse_inbound(r#"{"type":"authAck"}"#).unwrap(),
            InboundMessage::AuthAck
        );
    }

    #[test]
    fn parse_invalid_json_is_malformed() {
        let err = parse_inbound("not json").unwrap_err();
        assert_matches!(err, SessionError::MalformedFrame(_));
    }

    #[test]
    fn parse_missing_fields_is_malformed() {
        assert_matches!(
            parse_inbound(r#"{"foo":1}"#),
            Err(SessionError::MalformedFrame(_))
        );
        assert_matches!(
            parse_inbound(r#"{"latitude":40.0}"#),
            Err(SessionError::MalformedFrame(_))
        );
    }

    #[test]
    fn parse_non_numeric_fields_is_malformed() {
        assert_matches!(
            parse_inbound(r#"{"latitude":"40","longitude":"-73"}"#),
            Err(SessionError::MalformedFrame(_))
        );
    }

    #[test]
    fn parse_out_of_range_is_malformed() {
        assert_matches!(
            parse_inbound(r#"{"latitude":91.0,"longitude":0.0}"#),
            Err(SessionError::MalformedFrame(_))
        );
        assert_matches!(
            parse_inbound(r#"{"latitude":0.0,"longitude":-180.5}"#),
            Err(SessionError::MalformedFrame(_))
        );
    }

    #[test]
    fn outbound_roundtrip_without_timestamp() {
        // Deserializing a wire frame fills the timestamp with "now".
        let json = r#"{"type":"locationUpdate","latitude":1.0,"longitude":2.0}"#;
        let msg: OutboundMessage = serde_json::from_str(json).unwrap();
        assert_matches!(msg, OutboundMessage::LocationUpdate { latitude, longitude, .. } => {
            assert!((latitude - 1.0).abs() < f64::EPSILON);
            assert!((longitude - 2.0).abs() < f64::EPSILON);
        });
    }
}
