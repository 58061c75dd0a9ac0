//! Point selection for the report form.
//!
//! The form's `location` field is an [`EncodedPoint`] derived from one of two sources:
//! the device fix or the map center under the crosshair. The point is never edited by
//! hand; [`PointSelector`] re-derives it whenever the mode or either source changes.
//!
//! Both sources go through the same encoder, so the output is `POINT(<lon> <lat>)` with a
//! space separator regardless of where the coordinate came from.

use std::fmt;

use cimes_shared::models::Coordinate;
use cimes_shared::wkt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionMode {
    UseDeviceLocation,
    #[default]
    UseMapCenter,
}

impl SelectionMode {
    /// Mode the form opens in: the device fix when there is one, the map otherwise.
    pub fn initial(device_fix_present: bool) -> Self {
        if device_fix_present {
            SelectionMode::UseDeviceLocation
        } else {
            SelectionMode::UseMapCenter
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SelectionMode::UseDeviceLocation => SelectionMode::UseMapCenter,
            SelectionMode::UseMapCenter => SelectionMode::UseDeviceLocation,
        }
    }
}

/// Encoded `POINT(<lon> <lat>)`, or empty when nothing is selected yet.
///
/// The empty value is meaningful: the form must treat it as an unmet required field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EncodedPoint(String);

impl EncodedPoint {
    pub fn empty() -> Self {
        EncodedPoint(String::new())
    }

    pub fn from_coordinate(coord: Coordinate) -> Self {
        EncodedPoint(wkt::encode_point(coord))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The coordinate this point encodes, at the encoded precision.
    pub fn coordinate(&self) -> Option<Coordinate> {
        wkt::decode_point(&self.0).ok()
    }
}

impl fmt::Display for EncodedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pick the source for `mode` and encode it.
///
/// `UseDeviceLocation` falls back to the map center while there is no fix yet.
pub fn recompute(
    mode: SelectionMode,
    device: Option<Coordinate>,
    center: Option<Coordinate>,
) -> EncodedPoint {
    let source = match (mode, device) {
        (SelectionMode::UseDeviceLocation, Some(fix)) => Some(fix),
        _ => center,
    };
    source.map(EncodedPoint::from_coordinate).unwrap_or_default()
}

/// Holds the selection mode and the point last derived from it.
#[derive(Debug, Default)]
pub struct PointSelector {
    mode: SelectionMode,
    point: EncodedPoint,
}

impl PointSelector {
    pub fn new(mode: SelectionMode) -> Self {
        PointSelector {
            mode,
            point: EncodedPoint::empty(),
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn point(&self) -> &EncodedPoint {
        &self.point
    }

    /// Switch mode and re-derive. Returns whether the point changed.
    pub fn set_mode(
        &mut self,
        mode: SelectionMode,
        device: Option<Coordinate>,
        center: Option<Coordinate>,
    ) -> bool {
        self.mode = mode;
        self.update(device, center)
    }

    /// Re-derive from the current sources. Returns whether the point changed.
    pub fn update(&mut self, device: Option<Coordinate>, center: Option<Coordinate>) -> bool {
        let next = recompute(self.mode, device, center);
        if next == self.point {
            return false;
        }
        self.point = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICE: Coordinate = Coordinate {
        latitude: 45.83211,
        longitude: 6.86557,
    };
    const CENTER: Coordinate = Coordinate {
        latitude: 45.91,
        longitude: 6.88,
    };

    #[test]
    fn test_device_mode_uses_device_fix() {
        let point = recompute(SelectionMode::UseDeviceLocation, Some(DEVICE), Some(CENTER));
        assert_eq!(point.as_str(), "POINT(6.86557 45.83211)");
    }

    #[test]
    fn test_map_mode_uses_center_even_with_fix() {
        let point = recompute(SelectionMode::UseMapCenter, Some(DEVICE), Some(CENTER));
        assert_eq!(point.as_str(), "POINT(6.88000 45.91000)");
    }

    #[test]
    fn test_device_mode_without_fix_falls_back_to_center() {
        let point = recompute(SelectionMode::UseDeviceLocation, None, Some(CENTER));
        assert_eq!(point.as_str(), "POINT(6.88000 45.91000)");
    }

    #[test]
    fn test_empty_iff_both_sources_absent() {
        for mode in [SelectionMode::UseDeviceLocation, SelectionMode::UseMapCenter] {
            assert!(recompute(mode, None, None).is_empty());
            assert!(!recompute(mode, None, Some(CENTER)).is_empty());
        }
        assert!(!recompute(SelectionMode::UseDeviceLocation, Some(DEVICE), None).is_empty());
    }

    #[test]
    fn test_map_mode_with_only_device_fix_is_empty() {
        // The device fix never leaks into map mode.
        assert!(recompute(SelectionMode::UseMapCenter, Some(DEVICE), None).is_empty());
    }

    #[test]
    fn test_same_encoding_for_both_sources() {
        let from_device = recompute(SelectionMode::UseDeviceLocation, Some(DEVICE), None);
        let from_center = recompute(SelectionMode::UseMapCenter, None, Some(DEVICE));
        assert_eq!(from_device, from_center);
    }

    #[test]
    fn test_switching_to_device_mode_takes_effect_immediately() {
        let mut selector = PointSelector::new(SelectionMode::UseMapCenter);
        selector.update(Some(DEVICE), Some(CENTER));
        assert_eq!(selector.point().as_str(), "POINT(6.88000 45.91000)");

        assert!(selector.set_mode(SelectionMode::UseDeviceLocation, Some(DEVICE), Some(CENTER)));
        assert_eq!(selector.point().as_str(), "POINT(6.86557 45.83211)");
    }

    #[test]
    fn test_update_reports_unchanged_point() {
        let mut selector = PointSelector::new(SelectionMode::UseMapCenter);
        assert!(selector.update(None, Some(CENTER)));
        assert!(!selector.update(Some(DEVICE), Some(CENTER)));
        assert!(selector.update(None, None));
        assert!(selector.point().is_empty());
    }

    #[test]
    fn test_encoded_point_decodes_back() {
        let point = EncodedPoint::from_coordinate(DEVICE);
        assert_eq!(point.coordinate(), Some(DEVICE));
        assert_eq!(EncodedPoint::empty().coordinate(), None);
        assert_eq!(point.to_string(), "POINT(6.86557 45.83211)");
    }

    #[test]
    fn test_initial_mode_and_toggle() {
        assert_eq!(SelectionMode::initial(true), SelectionMode::UseDeviceLocation);
        assert_eq!(SelectionMode::initial(false), SelectionMode::UseMapCenter);
        assert_eq!(
            SelectionMode::UseMapCenter.toggled(),
            SelectionMode::UseDeviceLocation
        );
    }
}
