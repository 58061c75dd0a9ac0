use std::ops::Deref;
use std::sync::Arc;

use cimes_shared::models::{Coordinate, Report, ReportType};
use uuid::Uuid;

/// Decides, per zoom level, whether a report gets a marker. Clustering or decluttering
/// rules plug in here without touching marker rendering.
pub trait VisibilityPolicy {
    fn is_visible(&self, zoom: f64, report: &Report) -> bool;
}

impl<F> VisibilityPolicy for F
where
    F: Fn(f64, &Report) -> bool,
{
    fn is_visible(&self, zoom: f64, report: &Report) -> bool {
        self(zoom, report)
    }
}

/// Show every report once the zoom is strictly above `min_zoom`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomThreshold {
    pub min_zoom: f64,
}

impl Default for ZoomThreshold {
    fn default() -> Self {
        ZoomThreshold { min_zoom: 1.0 }
    }
}

impl VisibilityPolicy for ZoomThreshold {
    fn is_visible(&self, zoom: f64, _report: &Report) -> bool {
        zoom > self.min_zoom
    }
}

/// Subset of `reports` that `policy` shows at `zoom`, in collection order.
pub fn compute<'a, P>(policy: &P, zoom: f64, reports: &'a [Report]) -> Vec<&'a Report>
where
    P: VisibilityPolicy + ?Sized,
{
    reports
        .iter()
        .filter(|r| policy.is_visible(zoom, r))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerStyle {
    pub icon: &'static str,
    pub color: Option<&'static str>,
}

pub fn marker_style(report_type: ReportType) -> MarkerStyle {
    match report_type {
        ReportType::Danger => MarkerStyle {
            icon: "exclamation-circle",
            color: Some("red"),
        },
        ReportType::Highlight => MarkerStyle {
            icon: "landscape",
            color: None,
        },
        ReportType::Problem => MarkerStyle {
            icon: "nearby-error",
            color: None,
        },
    }
}

/// What the renderer needs to draw one report.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub report_id: Uuid,
    pub coordinate: Coordinate,
    pub title: String,
    pub report_type: ReportType,
    pub style: MarkerStyle,
}

impl From<&Report> for Marker {
    fn from(report: &Report) -> Self {
        Marker {
            report_id: report.id,
            coordinate: report.coordinate(),
            title: report.title.clone(),
            report_type: report.report_type,
            style: marker_style(report.report_type),
        }
    }
}

/// Markers of the visible reports. Clones share one allocation, so handing the set to
/// every snapshot costs nothing until the visible set is rebuilt.
#[derive(Debug, Clone, Default)]
pub struct MarkerSet(Arc<Vec<Marker>>);

impl MarkerSet {
    /// Whether both sets are the same build, without comparing contents.
    pub fn ptr_eq(&self, other: &MarkerSet) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for MarkerSet {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0 == other.0
    }
}

impl Deref for MarkerSet {
    type Target = [Marker];

    fn deref(&self) -> &[Marker] {
        &self.0
    }
}

/// Markers currently shown, rebuilt only on zoom or collection change.
pub struct ReportVisibilitySet {
    policy: Box<dyn VisibilityPolicy>,
    markers: MarkerSet,
}

impl ReportVisibilitySet {
    pub fn new(policy: impl VisibilityPolicy + 'static) -> Self {
        ReportVisibilitySet {
            policy: Box::new(policy),
            markers: MarkerSet::default(),
        }
    }

    /// Returns whether the visible set changed. With no known zoom nothing is shown.
    ///
    /// An unchanged result keeps the previous [`MarkerSet`] allocation.
    pub fn recompute(&mut self, zoom: Option<f64>, reports: &[Report]) -> bool {
        let next: Vec<Marker> = match zoom {
            Some(zoom) => compute(self.policy.as_ref(), zoom, reports)
                .into_iter()
                .map(Marker::from)
                .collect(),
            None => Vec::new(),
        };
        if *self.markers.0 == next {
            return false;
        }
        self.markers = MarkerSet(Arc::new(next));
        true
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn markers(&self) -> MarkerSet {
        self.markers.clone()
    }
}

impl Default for ReportVisibilitySet {
    fn default() -> Self {
        Self::new(ZoomThreshold::default())
    }
}

impl std::fmt::Debug for ReportVisibilitySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportVisibilitySet")
            .field("visible", &self.markers.len())
            .finish_non_exhaustive()
    }
}
