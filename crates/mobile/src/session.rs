//! The map screen's state, owned by one task.
//!
//! [`MapSession`] wires the components together: the permission gate drives the location
//! tracker, the viewport and the tracker feed the point selector, and the viewport zoom
//! drives report visibility. Every handler is synchronous; the only suspending work (the
//! OS permission dialog, the report fetches, posting a report) is run by the caller, which
//! feeds the results back through [`MapSession::permission_resolved`],
//! [`MapSession::set_reports`], [`MapSession::selection_finished`] and
//! [`MapSession::submission_finished`].

use cimes_shared::geo::BoundingBox;
use cimes_shared::models::{Coordinate, Report, ReportCreation};
use uuid::Uuid;

use crate::api::ApiError;
use crate::camera::{CameraController, RecenterOutcome};
use crate::config::SessionConfig;
use crate::error::CoreError;
use crate::events::{MapEvent, MapView};
use crate::location::LocationTracker;
use crate::notice::{Notice, Notices};
use crate::permission::{PermissionGate, PermissionOutcome, PermissionState, RequestStart};
use crate::selector::{EncodedPoint, PointSelector, SelectionMode};
use crate::submission::{self, ReportDraft};
use crate::viewport::ViewportObserver;
use crate::visibility::{MarkerSet, ReportVisibilitySet, VisibilityPolicy, ZoomThreshold};

/// Everything the UI renders, as one comparable value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub mounted: bool,
    pub permission: PermissionState,
    pub permission_pending: bool,
    pub device_location: Option<Coordinate>,
    pub map_center: Option<Coordinate>,
    pub zoom: Option<f64>,
    pub mode: SelectionMode,
    pub point: EncodedPoint,
    pub report_count: usize,
    pub markers: MarkerSet,
    /// Details of the marker the user opened, once fetched.
    pub selected_report: Option<Report>,
}

#[derive(Debug, Default)]
struct Selection {
    pending: Option<Uuid>,
    shown: Option<Report>,
}

pub struct MapSession<M: MapView> {
    map: M,
    config: SessionConfig,
    pub(crate) gate: PermissionGate,
    pub(crate) tracker: LocationTracker,
    pub(crate) viewport: ViewportObserver,
    selector: PointSelector,
    visibility: ReportVisibilitySet,
    camera: CameraController,
    reports: Vec<Report>,
    selection: Selection,
    notices: Notices,
    mounted: bool,
    disposed: bool,
}

impl<M: MapView> MapSession<M> {
    pub fn new(map: M, config: SessionConfig) -> Self {
        let policy = ZoomThreshold {
            min_zoom: config.visibility_threshold,
        };
        MapSession {
            camera: CameraController::new(config.camera_settings()),
            visibility: ReportVisibilitySet::new(policy),
            map,
            config,
            gate: PermissionGate::new(),
            tracker: LocationTracker::new(),
            viewport: ViewportObserver::new(),
            selector: PointSelector::new(SelectionMode::initial(false)),
            reports: Vec::new(),
            selection: Selection::default(),
            notices: Notices::new(),
            mounted: false,
            disposed: false,
        }
    }

    /// Replace the zoom-threshold rule with another visibility policy.
    pub fn with_visibility_policy(mut self, policy: impl VisibilityPolicy + 'static) -> Self {
        self.visibility = ReportVisibilitySet::new(policy);
        self.visibility.recompute(self.viewport.zoom(), &self.reports);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    /// Area to fetch reports for, from the configured half span around the initial center.
    pub fn report_area(&self) -> Option<BoundingBox> {
        self.config
            .report_area_half_span
            .map(|half_span| BoundingBox::around(self.config.initial_center, half_span))
    }

    /// Position the camera, start observing it and ask for the location grant.
    ///
    /// Returns `Started` when the caller must now run the OS permission request. A repeated
    /// mount does nothing and reports `InFlight`.
    pub fn mount(&mut self) -> RequestStart {
        if self.disposed || self.mounted {
            return RequestStart::InFlight;
        }
        self.mounted = true;

        let center = self.config.initial_center;
        let zoom = self.config.initial_zoom;
        self.camera.set_initial_camera(&mut self.map, center, zoom);
        self.viewport.attach(&mut self.map);
        self.viewport.seed(center, zoom);
        self.refresh_point();
        self.visibility.recompute(self.viewport.zoom(), &self.reports);
        tracing::info!(lat = center.latitude, lon = center.longitude, zoom, "Map session mounted");

        self.gate.begin_request()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Returns whether anything the UI shows changed.
    pub fn handle_event(&mut self, event: MapEvent) -> bool {
        if self.disposed {
            return false;
        }
        match event {
            MapEvent::Camera(camera) => {
                let change = self.viewport.on_camera_changed(&camera);
                let mut changed = change.any();
                if change.zoom {
                    changed |= self.visibility.recompute(self.viewport.zoom(), &self.reports);
                }
                if change.center {
                    changed |= self.refresh_point();
                }
                changed
            }
            MapEvent::Location(update) => {
                if !self.tracker.on_update(&update) {
                    return false;
                }
                self.refresh_point();
                true
            }
        }
    }

    /// Start a permission request on behalf of the user.
    pub fn request_permission(&mut self) -> RequestStart {
        if self.disposed {
            return RequestStart::InFlight;
        }
        self.gate.begin_request()
    }

    /// The grant was withdrawn outside the app. Tracking stops and the device fix is
    /// forgotten.
    pub fn permission_revoked(&mut self) -> PermissionState {
        if self.disposed {
            return self.gate.current();
        }
        let state = self.gate.revoke();
        if self.tracker.sync_permission(state, &mut self.map) {
            self.refresh_point();
        }
        state
    }

    /// Apply the OS dialog's answer.
    pub fn permission_resolved(
        &mut self,
        result: Result<PermissionOutcome, String>,
    ) -> PermissionState {
        if self.disposed {
            return self.gate.current();
        }
        let state = self.gate.resolve(result, &mut self.notices);
        if self.tracker.sync_permission(state, &mut self.map) {
            self.refresh_point();
        }
        state
    }

    pub fn recenter(&mut self) -> RecenterOutcome {
        if self.disposed {
            return RecenterOutcome::AwaitingFix;
        }
        self.camera.recenter_on_device(
            &mut self.map,
            &mut self.gate,
            &self.tracker,
            &mut self.notices,
        )
    }

    pub fn set_mode(&mut self, mode: SelectionMode) -> bool {
        self.selector
            .set_mode(mode, self.tracker.last_known(), self.viewport.center())
    }

    pub fn toggle_mode(&mut self) -> SelectionMode {
        let next = self.selector.mode().toggled();
        self.set_mode(next);
        next
    }

    pub fn mode(&self) -> SelectionMode {
        self.selector.mode()
    }

    pub fn encoded_point(&self) -> &EncodedPoint {
        self.selector.point()
    }

    pub fn permission(&self) -> PermissionState {
        self.gate.current()
    }

    pub fn device_location(&self) -> Option<Coordinate> {
        self.tracker.last_known()
    }

    pub fn map_center(&self) -> Option<Coordinate> {
        self.viewport.center()
    }

    pub fn zoom(&self) -> Option<f64> {
        self.viewport.zoom()
    }

    /// Replace the report collection. Returns whether the visible set changed.
    pub fn set_reports(&mut self, reports: Vec<Report>) -> bool {
        self.reports = reports;
        self.visibility.recompute(self.viewport.zoom(), &self.reports)
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn markers(&self) -> MarkerSet {
        self.visibility.markers()
    }

    /// Open a marker's details. Returns whether the caller must now fetch the report.
    pub fn select_report(&mut self, id: Uuid) -> bool {
        if self.disposed {
            return false;
        }
        if self.selection.shown.as_ref().is_some_and(|r| r.id == id) {
            return false;
        }
        self.selection = Selection {
            pending: Some(id),
            shown: None,
        };
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::default();
    }

    pub fn selected_report(&self) -> Option<&Report> {
        self.selection.shown.as_ref()
    }

    /// Apply a detail fetch. Answers for a selection that was since replaced or cleared
    /// are dropped.
    pub fn selection_finished(&mut self, id: Uuid, result: Result<Report, ApiError>) {
        if self.disposed || self.selection.pending != Some(id) {
            tracing::debug!(%id, "Stale report details ignored");
            return;
        }
        self.selection.pending = None;
        match result {
            Ok(report) => self.selection.shown = Some(report),
            Err(e) => {
                let err = CoreError::FetchFailed(e.to_string());
                tracing::warn!(%id, error = %err, "Report details unavailable");
            }
        }
    }

    /// Validate the draft against the current point. A missing field is reported as a
    /// notice and the form stays open.
    pub fn prepare_submission(&mut self, draft: &ReportDraft) -> Result<ReportCreation, CoreError> {
        draft.to_creation(self.selector.point()).inspect_err(|e| {
            self.notices.push(Notice::SubmissionFailed(e.to_string()));
        })
    }

    /// Apply the backend's answer to a submission. A stored report joins the collection.
    pub fn submission_finished(
        &mut self,
        result: Result<Report, ApiError>,
    ) -> Result<Report, CoreError> {
        let report = submission::complete(result, &mut self.notices)?;
        self.reports.push(report.clone());
        self.visibility.recompute(self.viewport.zoom(), &self.reports);
        Ok(report)
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain().collect()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            mounted: self.mounted,
            permission: self.gate.current(),
            permission_pending: self.gate.is_pending(),
            device_location: self.tracker.last_known(),
            map_center: self.viewport.center(),
            zoom: self.viewport.zoom(),
            mode: self.selector.mode(),
            point: self.selector.point().clone(),
            report_count: self.reports.len(),
            markers: self.markers(),
            selected_report: self.selection.shown.clone(),
        }
    }

    /// Drop every subscription. Events and answers arriving later are ignored.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.viewport.detach(&mut self.map);
        self.tracker.dispose(&mut self.map);
        tracing::info!("Map session disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn refresh_point(&mut self) -> bool {
        self.selector
            .update(self.tracker.last_known(), self.viewport.center())
    }
}
