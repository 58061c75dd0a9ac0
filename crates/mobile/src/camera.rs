use cimes_shared::models::Coordinate;

use crate::events::{AnimationMode, CameraCommand, MapView};
use crate::location::LocationTracker;
use crate::notice::{Notice, Notices};
use crate::permission::{PermissionGate, RequestStart};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSettings {
    pub initial_duration_ms: u64,
    pub recenter_zoom: f64,
    pub recenter_duration_ms: u64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        CameraSettings {
            initial_duration_ms: 1000,
            recenter_zoom: 16.0,
            recenter_duration_ms: 1500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecenterOutcome {
    Moved(CameraCommand),
    /// Granted, but no fix has arrived yet. Nothing happens.
    AwaitingFix,
    /// Not granted: the camera stayed put and a new permission request was started.
    PermissionRequested,
    /// Not granted and a request is already on screen.
    PermissionPending,
}

/// Issues camera moves against the map view.
#[derive(Debug, Default)]
pub struct CameraController {
    settings: CameraSettings,
    initial: Option<CameraCommand>,
}

impl CameraController {
    pub fn new(settings: CameraSettings) -> Self {
        CameraController {
            settings,
            initial: None,
        }
    }

    pub fn initial_camera(&self) -> Option<&CameraCommand> {
        self.initial.as_ref()
    }

    /// Position the camera at mount. Only the first call moves it.
    pub fn set_initial_camera<M: MapView>(
        &mut self,
        map: &mut M,
        center: Coordinate,
        zoom: f64,
    ) -> bool {
        if self.initial.is_some() {
            return false;
        }
        let command = CameraCommand {
            center,
            zoom_level: zoom,
            animation_mode: AnimationMode::EaseTo,
            duration_ms: self.settings.initial_duration_ms,
        };
        map.move_camera(command);
        self.initial = Some(command);
        true
    }

    /// Fly to the device fix, or ask for the permission that would allow it.
    pub fn recenter_on_device<M: MapView>(
        &mut self,
        map: &mut M,
        gate: &mut PermissionGate,
        tracker: &LocationTracker,
        notices: &mut Notices,
    ) -> RecenterOutcome {
        if gate.current().require_granted().is_err() {
            notices.push(Notice::PermissionNeeded);
            return match gate.begin_request() {
                RequestStart::Started => RecenterOutcome::PermissionRequested,
                RequestStart::InFlight | RequestStart::AlreadyGranted => {
                    RecenterOutcome::PermissionPending
                }
            };
        }

        let Some(fix) = tracker.last_known() else {
            tracing::debug!("Recenter requested before the first location fix");
            return RecenterOutcome::AwaitingFix;
        };

        let command = CameraCommand {
            center: fix,
            zoom_level: self.settings.recenter_zoom,
            animation_mode: AnimationMode::FlyTo,
            duration_ms: self.settings.recenter_duration_ms,
        };
        tracing::debug!(lat = fix.latitude, lon = fix.longitude, "Flying to device location");
        map.move_camera(command);
        RecenterOutcome::Moved(command)
    }
}
