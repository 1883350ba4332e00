//! Read-only view binding over the reconciled location.

use tokio::sync::watch;

use waypoint_core::CurrentLocation;

/// Observable location state for the rendering layer.
///
/// Purely reactive: forwards the reconciler's latest snapshot whenever it
/// changes, at a cadence driven by reconciler updates. Holds only a read
/// reference; it can never mutate the location.
#[derive(Clone)]
pub struct LocationFeed {
    rx: watch::Receiver<CurrentLocation>,
}

impl LocationFeed {
    pub(crate) fn new(rx: watch::Receiver<CurrentLocation>) -> Self {
        Self { rx }
    }

    /// The latest snapshot. Never blocks.
    #[must_use]
    pub fn current(&self) -> CurrentLocation {
        *self.rx.borrow()
    }

    /// Wait for the next change and return the new snapshot.
    ///
    /// Returns `None` once the owning reconciler is dropped.
    pub async fn next_change(&mut self) -> Option<CurrentLocation> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
