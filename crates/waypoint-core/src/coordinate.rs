//! Validated coordinate value types and the displayable location cell.
//!
//! [`Coordinate`] is the only way latitude/longitude pairs enter the system:
//! the constructor rejects out-of-range and non-finite values rather than
//! clamping them, so every downstream consumer can assume validity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A validated geographic coordinate.
///
/// Invariant: latitude ∈ [-90, 90], longitude ∈ [-180, 180], both finite.
/// Construct via [`Coordinate::new`]; there is no way to hold an invalid pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawCoordinate")]
pub struct Coordinate {
    /// Degrees north of the equator, in [-90, 90].
    latitude: f64,
    /// Degrees east of the prime meridian, in [-180, 180].
    longitude: f64,
}

/// Unvalidated wire shape; deserialization funnels through [`Coordinate::new`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = String;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude).ok_or_else(|| {
            format!(
                "coordinate out of range: {}, {}",
                raw.latitude, raw.longitude
            )
        })
    }
}

impl Coordinate {
    /// Create a coordinate, rejecting out-of-range or non-finite values.
    ///
    /// Values outside the valid ranges are rejected, not clamped.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }

    /// Degrees latitude.
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Degrees longitude.
    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Where a location value came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Provenance {
    /// The configured startup coordinate (no fix accepted yet, or post-reset).
    Default,
    /// The device's own sampler (the "self" position).
    Local,
    /// Pushed by the server.
    Remote,
}

/// The single authoritative displayable location.
///
/// Owned exclusively by the reconciler; everything else holds read access.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentLocation {
    /// The latest accepted coordinate.
    pub coordinate: Coordinate,
    /// Which side produced it.
    pub provenance: Provenance,
    /// When it was accepted.
    pub timestamp: DateTime<Utc>,
}

impl CurrentLocation {
    /// The startup value for a configured default coordinate.
    #[must_use]
    pub fn initial(default: Coordinate) -> Self {
        Self {
            coordinate: default,
            provenance: Provenance::Default,
            timestamp: Utc::now(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn valid_coordinate_accepted() {
        let c = Coordinate::new(37.78825, -122.4324).unwrap();
        assert!((c.latitude() - 37.78825).abs() < f64::EPSILON);
        assert!((c.longitude() - -122.4324).abs() < f64::EPSILON);
    }

    #[test]
    fn boundary_values_accepted() {
        assert!(Coordinate::new(90.0, 180.0).is_some());
        assert!(Coordinate::new(-90.0, -180.0).is_some());
        assert!(Coordinate::new(0.0, 0.0).is_some());
    }

    #[test]
    fn out_of_range_latitude_rejected() {
        assert!(Coordinate::new(90.0001, 0.0).is_none());
        assert!(Coordinate::new(-91.0, 0.0).is_none());
    }

    #[test]
    fn out_of_range_longitude_rejected() {
        assert!(Coordinate::new(0.0, 180.0001).is_none());
        assert!(Coordinate::new(0.0, -200.0).is_none());
    }

    #[test]
    fn non_finite_rejected() {
        assert!(Coordinate::new(f64::NAN, 0.0).is_none());
        assert!(Coordinate::new(0.0, f64::NAN).is_none());
        assert!(Coordinate::new(f64::INFINITY, 0.0).is_none());
        assert!(Coordinate::new(0.0, f64::NEG_INFINITY).is_none());
    }

    #[test]
    fn serde_roundtrip() {
        let c = Coordinate::new(40.0, -73.0).unwrap();
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains("\"latitude\":40.0"));
        let back: Coordinate = serde_json::from_str(&json).unwrap();
        assert_eq!(c, back);
    }

    #[test]
    fn deserialization_rejects_invalid_pairs() {
        // Deserialization must not be a side door around the constructor.
        assert!(serde_json::from_str::<Coordinate>(r#"{"latitude":999.0,"longitude":0.0}"#).is_err());
        assert!(
            serde_json::from_str::<Coordinate>(r#"{"latitude":0.0,"longitude":-180.5}"#).is_err()
        );
        assert!(serde_json::from_str::<Coordinate>(r#"{"latitude":-91.0,"longitude":0.0}"#).is_err());
    }

    #[test]
    fn initial_location_has_default_provenance() {
        let default = Coordinate::new(37.78825, -122.4324).unwrap();
        let loc = CurrentLocation::initial(default);
        assert_eq!(loc.coordinate, default);
        assert_eq!(loc.provenance, Provenance::Default);
    }

    proptest! {
        #[test]
        fn in_range_always_accepted(lat in -90.0f64..=90.0, lon in -180.0f64..=180.0) {
            prop_assert!(Coordinate::new(lat, lon).is_some());
        }

        #[test]
        fn latitude_above_range_always_rejected(lat in 90.0001f64..1e6, lon in -180.0f64..=180.0) {
            prop_assert!(Coordinate::new(lat, lon).is_none());
        }

        #[test]
        fn longitude_below_range_always_rejected(lat in -90.0f64..=90.0, lon in -1e6f64..-180.0001) {
            prop_assert!(Coordinate::new(lat, lon).is_none());
        }
    }
}
