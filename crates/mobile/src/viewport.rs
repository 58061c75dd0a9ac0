use cimes_shared::models::Coordinate;

use crate::events::{CameraChanged, EventKind, MapView, Subscription};

/// Which fields a camera event actually changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewportChange {
    pub zoom: bool,
    pub center: bool,
}

impl ViewportChange {
    pub fn any(self) -> bool {
        self.zoom || self.center
    }
}

/// Current map center and zoom, as reported by camera-change events.
///
/// Runs on every camera frame while the map moves, so handling an event only copies
/// fields.
#[derive(Debug, Default)]
pub struct ViewportObserver {
    pub(crate) subscription: Option<Subscription>,
    center: Option<Coordinate>,
    zoom: Option<f64>,
}

impl ViewportObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach<M: MapView>(&mut self, map: &mut M) {
        if self.subscription.is_none() {
            self.subscription = Some(map.subscribe(EventKind::CameraChanged));
        }
    }

    pub fn detach<M: MapView>(&mut self, map: &mut M) {
        if let Some(sub) = self.subscription.take() {
            map.unsubscribe(sub.id());
        }
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn center(&self) -> Option<Coordinate> {
        self.center
    }

    pub fn zoom(&self) -> Option<f64> {
        self.zoom
    }

    /// Fill in values not yet observed, e.g. from the initial camera. Out-of-range values
    /// are skipped like they are for camera events.
    pub fn seed(&mut self, center: Coordinate, zoom: f64) {
        if self.center.is_none() && center.is_valid() {
            self.center = Some(center);
        }
        if self.zoom.is_none() && zoom.is_finite() {
            self.zoom = Some(zoom);
        }
    }

    /// Copy whatever the event carries; absent fields keep their previous value.
    pub fn on_camera_changed(&mut self, event: &CameraChanged) -> ViewportChange {
        let mut change = ViewportChange::default();

        if let Some(zoom) = event.zoom_level.filter(|z| z.is_finite()) {
            change.zoom = self.zoom != Some(zoom);
            self.zoom = Some(zoom);
        }
        if let Some(pair) = event.center_coordinate {
            let center = Coordinate::from_lon_lat(pair);
            if center.is_valid() {
                change.center = self.center != Some(center);
                self.center = Some(center);
            }
        }
        change
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MapViewHub;

    fn event(zoom: Option<f64>, center: Option<[f64; 2]>) -> CameraChanged {
        CameraChanged {
            zoom_level: zoom,
            center_coordinate: center,
        }
    }

    #[test]
    fn test_full_event_updates_both() {
        let mut vp = ViewportObserver::new();
        let change = vp.on_camera_changed(&event(Some(15.0), Some([6.86557, 45.83211])));
        assert_eq!(change, ViewportChange { zoom: true, center: true });
        assert_eq!(vp.zoom(), Some(15.0));
        assert_eq!(vp.center(), Some(Coordinate::new(45.83211, 6.86557)));
    }

    #[test]
    fn test_zoom_only_event_keeps_center() {
        let mut vp = ViewportObserver::new();
        vp.on_camera_changed(&event(Some(15.0), Some([6.86557, 45.83211])));

        let change = vp.on_camera_changed(&event(Some(12.5), None));
        assert_eq!(change, ViewportChange { zoom: true, center: false });
        assert_eq!(vp.center(), Some(Coordinate::new(45.83211, 6.86557)));
        assert_eq!(vp.zoom(), Some(12.5));
    }

    #[test]
    fn test_center_only_event_keeps_zoom() {
        let mut vp = ViewportObserver::new();
        vp.on_camera_changed(&event(Some(15.0), Some([6.86557, 45.83211])));

        let change = vp.on_camera_changed(&event(None, Some([6.9, 45.9])));
        assert_eq!(change, ViewportChange { zoom: false, center: true });
        assert_eq!(vp.zoom(), Some(15.0));
        assert_eq!(vp.center(), Some(Coordinate::new(45.9, 6.9)));
    }

    #[test]
    fn test_empty_and_repeated_events_change_nothing() {
        let mut vp = ViewportObserver::new();
        vp.on_camera_changed(&event(Some(15.0), Some([6.0, 45.0])));
        assert!(!vp.on_camera_changed(&event(None, None)).any());
        assert!(!vp.on_camera_changed(&event(Some(15.0), Some([6.0, 45.0]))).any());
    }

    #[test]
    fn test_invalid_values_are_ignored() {
        let mut vp = ViewportObserver::new();
        vp.on_camera_changed(&event(Some(15.0), Some([6.0, 45.0])));
        let change = vp.on_camera_changed(&event(Some(f64::NAN), Some([45.0, 120.0])));
        assert!(!change.any());
        assert_eq!(vp.zoom(), Some(15.0));
    }

    #[test]
    fn test_seed_does_not_override_observed_values() {
        let mut vp = ViewportObserver::new();
        vp.on_camera_changed(&event(Some(11.0), None));
        vp.seed(Coordinate::new(45.832119, 6.865575), 15.0);
        assert_eq!(vp.zoom(), Some(11.0));
        assert_eq!(vp.center(), Some(Coordinate::new(45.832119, 6.865575)));
    }

    #[test]
    fn test_seed_skips_out_of_range_values() {
        let mut vp = ViewportObserver::new();
        vp.seed(Coordinate::new(120.0, 6.0), f64::NAN);
        assert_eq!(vp.center(), None);
        assert_eq!(vp.zoom(), None);

        vp.seed(Coordinate::new(45.832119, 6.865575), 15.0);
        assert_eq!(vp.center(), Some(Coordinate::new(45.832119, 6.865575)));
        assert_eq!(vp.zoom(), Some(15.0));
    }

    #[test]
    fn test_attach_is_idempotent() {
        let mut hub = MapViewHub::new();
        let mut vp = ViewportObserver::new();
        vp.attach(&mut hub);
        vp.attach(&mut hub);
        assert_eq!(hub.subscriber_count(EventKind::CameraChanged), 1);
        vp.detach(&mut hub);
        assert!(!vp.is_attached());
        assert_eq!(hub.subscriber_count(EventKind::CameraChanged), 0);
    }
}
