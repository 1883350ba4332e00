//! Last-write-wins reconciliation of local and remote position updates.

use chrono::Utc;
use tokio::sync::watch;
use tracing::debug;

use waypoint_core::{Coordinate, CurrentLocation, Provenance};

use crate::feed::LocationFeed;

/// Exclusive owner of [`CurrentLocation`].
///
/// Whichever of the local sampler or the server pushes most recently wins,
/// regardless of provenance. This is a deliberate simplicity trade-off,
/// not a causality-aware merge; the wire protocol carries no timestamps
/// to order by.
///
/// Both apply operations are total and infallible: an out-of-range pair
/// cannot be constructed as a [`Coordinate`], so rejection happens at the
/// boundaries (frame parsing, the geo provider) and nothing invalid can
/// reach this cell. View bindings hold only [`LocationFeed`] read handles.
pub struct Reconciler {
    tx: watch::Sender<CurrentLocation>,
    default: Coordinate,
}

impl Reconciler {
    /// Create a reconciler initialized to the configured default coordinate.
    #[must_use]
    pub fn new(default: Coordinate) -> Self {
        let (tx, _rx) = watch::channel(CurrentLocation::initial(default));
        Self { tx, default }
    }

    /// Apply a locally sampled fix.
    pub fn apply_local(&self, coordinate: Coordinate) {
        self.apply(coordinate, Provenance::Local);
    }

    /// Apply a server-pushed fix.
    pub fn apply_remote(&self, coordinate: Coordinate) {
        self.apply(coordinate, Provenance::Remote);
    }

    fn apply(&self, coordinate: Coordinate, provenance: Provenance) {
        let next = CurrentLocation {
            coordinate,
            provenance,
            timestamp: Utc::now(),
        };
        debug!(
            latitude = coordinate.latitude(),
            longitude = coordinate.longitude(),
            ?provenance,
            "location updated"
        );
        let _ = self.tx.send_replace(next);
    }

    /// Read-only snapshot of the current location. Never blocks.
    #[must_use]
    pub fn current(&self) -> CurrentLocation {
        *self.tx.borrow()
    }

    /// Reset to the default coordinate (session teardown).
    pub fn reset(&self) {
        debug!("location reset to default");
        let _ = self.tx.send_replace(CurrentLocation::initial(self.default));
    }

    /// A read handle for the view binding.
    #[must_use]
    pub fn subscribe(&self) -> LocationFeed {
        LocationFeed::new(self.tx.subscribe())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn default_coord() -> Coordinate {
        Coordinate::new(37.78825, -122.4324).unwrap()
    }

    #[test]
    fn starts_at_default() {
        let reconciler = Reconciler::new(default_coord());
        let loc = reconciler.current();
        assert_eq!(loc.coordinate, default_coord());
        assert_eq!(loc.provenance, Provenance::Default);
    }

    #[test]
    fn local_update_accepted() {
        let reconciler = Reconciler::new(default_coord());
        let c = Coordinate::new(40.0, -73.0).unwrap();
        reconciler.apply_local(c);
        let loc = reconciler.current();
        assert_eq!(loc.coordinate, c);
        assert_eq!(loc.provenance, Provenance::Local);
    }

    #[test]
    fn remote_update_accepted() {
        let reconciler = Reconciler::new(default_coord());
        let c = Coordinate::new(40.0, -73.0).unwrap();
        reconciler.apply_remote(c);
        assert_eq!(reconciler.current().provenance, Provenance::Remote);
    }

    #[test]
    fn last_write_wins_local_then_remote() {
        let reconciler = Reconciler::new(default_coord());
        let c1 = Coordinate::new(10.0, 10.0).unwrap();
        let c2 = Coordinate::new(20.0, 20.0).unwrap();
        reconciler.apply_local(c1);
        reconciler.apply_remote(c2);
        let loc = reconciler.current();
        assert_eq!(loc.coordinate, c2);
        assert_eq!(loc.provenance, Provenance::Remote);
    }

    #[test]
    fn last_write_wins_remote_then_local() {
        let reconciler = Reconciler::new(default_coord());
        let c1 = Coordinate::new(10.0, 10.0).unwrap();
        let c2 = Coordinate::new(20.0, 20.0).unwrap();
        reconciler.apply_remote(c1);
        reconciler.apply_local(c2);
        let loc = reconciler.current();
        assert_eq!(loc.coordinate, c2);
        assert_eq!(loc.provenance, Provenance::Local);
    }

    #[test]
    fn remote_overrides_earlier_self_fix() {
        // Scenario from the streaming flow: a server push always displaces
        // an earlier local fix.
        let reconciler = Reconciler::new(default_coord());
        let self_fix = Coordinate::new(37.78825, -122.4324).unwrap();
        let push = Coordinate::new(40.0, -73.0).unwrap();
        reconciler.apply_local(self_fix);
        reconciler.apply_remote(push);
        let loc = reconciler.current();
        assert_eq!(loc.coordinate, push);
        assert_eq!(loc.provenance, Provenance::Remote);
    }

    #[test]
    fn reset_restores_default() {
        let reconciler = Reconciler::new(default_coord());
        reconciler.apply_local(Coordinate::new(1.0, 2.0).unwrap());
        reconciler.reset();
        let loc = reconciler.current();
        assert_eq!(loc.coordinate, default_coord());
        assert_eq!(loc.provenance, Provenance::Default);
    }

    #[test]
    fn timestamps_move_forward() {
        let reconciler = Reconciler::new(default_coord());
        let first = reconciler.current().timestamp;
        reconciler.apply_local(Coordinate::new(1.0, 2.0).unwrap());
        assert!(reconciler.current().timestamp >= first);
    }

    #[tokio::test]
    async fn subscribers_see_updates() {
        let reconciler = Reconciler::new(default_coord());
        let mut feed = reconciler.subscribe();
        let c = Coordinate::new(40.0, -73.0).unwrap();
        reconciler.apply_remote(c);
        let loc = feed.next_change().await.unwrap();
        assert_eq!(loc.coordinate, c);
    }
}
