use cimes_shared::models::Coordinate;

use crate::events::{EventKind, LocationUpdate, MapView, Subscription};
use crate::permission::PermissionState;

/// Last known device position, fed by the map view's location stream while the location
/// grant holds.
#[derive(Debug, Default)]
pub struct LocationTracker {
    pub(crate) subscription: Option<Subscription>,
    last: Option<Coordinate>,
}

impl LocationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn last_known(&self) -> Option<Coordinate> {
        self.last
    }

    /// Subscribe when granted, unsubscribe otherwise. Returns whether the tracker changed.
    ///
    /// Losing the grant also forgets the last fix.
    pub fn sync_permission<M: MapView>(&mut self, state: PermissionState, map: &mut M) -> bool {
        match (state.is_granted(), self.subscription.is_some()) {
            (true, false) => {
                self.subscription = Some(map.subscribe(EventKind::DeviceLocation));
                tracing::debug!("Location tracking started");
                true
            }
            (false, true) => {
                self.dispose(map);
                true
            }
            _ => false,
        }
    }

    /// Record an update. Ignored when inactive or when the payload has no valid fix.
    pub fn on_update(&mut self, update: &LocationUpdate) -> bool {
        if self.subscription.is_none() {
            return false;
        }
        match update.coords {
            Some(coord) if coord.is_valid() => {
                self.last = Some(coord);
                true
            }
            Some(coord) => {
                tracing::debug!(?coord, "Discarding out-of-range location fix");
                false
            }
            None => false,
        }
    }

    pub fn dispose<M: MapView>(&mut self, map: &mut M) {
        if let Some(sub) = self.subscription.take() {
            map.unsubscribe(sub.id());
            tracing::debug!("Location tracking stopped");
        }
        self.last = None;
    }
}
