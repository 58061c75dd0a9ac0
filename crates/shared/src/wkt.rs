//! Well-Known Text encoding of single points.
//!
//! The canonical form is `POINT(<lon> <lat>)`: longitude first, one space between the
//! axes, each axis rounded to [`DECIMAL_PRECISION`] digits. Every producer in the
//! workspace goes through [`encode_point`], whatever the coordinate came from.
//!
//! Decoding is more lenient and also accepts the legacy `POINT(<lon>, <lat>)` form that
//! older clients submitted.

use thiserror::Error;

use crate::models::Coordinate;

pub const DECIMAL_PRECISION: usize = 5;

const SCALE: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WktError {
    #[error("expected a POINT geometry, got {0:?}")]
    NotAPoint(String),
    #[error("expected two axes in point, got {0}")]
    AxisCount(usize),
    #[error("invalid number {0:?} in point")]
    InvalidNumber(String),
    #[error("point out of range (lat {latitude}, lon {longitude})")]
    OutOfRange { latitude: f64, longitude: f64 },
}

/// Round to [`DECIMAL_PRECISION`] decimals. Negative zero collapses to zero.
pub fn round_to_precision(value: f64) -> f64 {
    let rounded = (value * SCALE).round() / SCALE;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Encode a coordinate as `POINT(<lon> <lat>)`.
pub fn encode_point(coord: Coordinate) -> String {
    format!(
        "POINT({:.prec$} {:.prec$})",
        round_to_precision(coord.longitude),
        round_to_precision(coord.latitude),
        prec = DECIMAL_PRECISION
    )
}

/// Decode a `POINT(lon lat)` string and check the coordinate ranges.
pub fn decode_point(text: &str) -> Result<Coordinate, WktError> {
    let trimmed = text.trim();
    let body = strip_point_keyword(trimmed).ok_or_else(|| WktError::NotAPoint(text.to_string()))?;
    let body = body
        .trim()
        .strip_prefix('(')
        .and_then(|b| b.strip_suffix(')'))
        .ok_or_else(|| WktError::NotAPoint(text.to_string()))?;

    let axes: Vec<&str> = body
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect();
    if axes.len() != 2 {
        return Err(WktError::AxisCount(axes.len()));
    }

    let parse = |s: &str| -> Result<f64, WktError> {
        s.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| WktError::InvalidNumber(s.to_string()))
    };
    let coord = Coordinate::from_lon_lat([parse(axes[0])?, parse(axes[1])?]);

    if !coord.is_valid() {
        return Err(WktError::OutOfRange {
            latitude: coord.latitude,
            longitude: coord.longitude,
        });
    }
    Ok(coord)
}

fn strip_point_keyword(text: &str) -> Option<&str> {
    let keyword = text.get(..5)?;
    if keyword.eq_ignore_ascii_case("POINT") {
        text.get(5..)
    } else {
        None
    }
}
