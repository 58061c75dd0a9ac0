//! Area queries over WGS84 coordinates.
//!
//! A bounding box is given as `minLon,minLat,maxLon,maxLat` (the same axis order as the
//! encoded points). Boxes crossing the antimeridian are not supported.

use serde::{Deserialize, Serialize};

use crate::models::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Box centered on `center`, extending `half_span` degrees on each axis, clamped to
    /// the valid coordinate ranges.
    pub fn around(center: Coordinate, half_span: f64) -> Self {
        BoundingBox {
            min_lon: (center.longitude - half_span).clamp(-180.0, 180.0),
            min_lat: (center.latitude - half_span).clamp(-90.0, 90.0),
            max_lon: (center.longitude + half_span).clamp(-180.0, 180.0),
            max_lat: (center.latitude + half_span).clamp(-90.0, 90.0),
        }
    }

    /// Parse `minLon,minLat,maxLon,maxLat`.
    pub fn parse(text: &str) -> Result<Self, String> {
        let parts: Vec<f64> = text
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<f64>()
                    .map_err(|e| format!("invalid bbox component {:?}: {}", p, e))
            })
            .collect::<Result<_, _>>()?;

        let [min_lon, min_lat, max_lon, max_lat] = parts[..] else {
            return Err(format!("bbox needs 4 components, got {}", parts.len()));
        };

        let bbox = BoundingBox {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        };
        if !bbox.is_valid() {
            return Err(format!("bbox out of range or inverted: {}", text));
        }
        Ok(bbox)
    }

    pub fn is_valid(&self) -> bool {
        Coordinate::new(self.min_lat, self.min_lon).is_valid()
            && Coordinate::new(self.max_lat, self.max_lon).is_valid()
            && self.min_lon <= self.max_lon
            && self.min_lat <= self.max_lat
    }

    /// Edges are inclusive.
    pub fn contains(&self, coord: Coordinate) -> bool {
        (self.min_lon..=self.max_lon).contains(&coord.longitude)
            && (self.min_lat..=self.max_lat).contains(&coord.latitude)
    }

    /// Query-string form accepted by [`BoundingBox::parse`].
    pub fn to_query_value(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}
