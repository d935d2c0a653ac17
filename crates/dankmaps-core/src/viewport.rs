//! Viewport fitting: frame a set of points in a single map region.
//!
//! The fit is a plain bounding box. Point sets that straddle the
//! antimeridian are not unwrapped, so a set spanning 179°E and 179°W is
//! framed across the whole globe. That is acceptable for a single-country
//! directory and is left as a known limitation.

use crate::geo::{GeoPoint, Region};

/// Span multiplier applied to the bounding box so edge markers are not
/// drawn flush against the screen border.
pub const DEFAULT_PADDING_FACTOR: f64 = 1.5;

/// Span used on an axis whose bounding box has zero width.
pub const DEFAULT_MIN_DELTA: f64 = 0.05;

/// Fits a region around `points` with the default padding and minimum span.
///
/// Returns `None` for an empty slice; the caller keeps its previous region.
#[must_use]
pub fn fit_region(points: &[GeoPoint]) -> Option<Region> {
    fit_region_with(points, DEFAULT_PADDING_FACTOR, DEFAULT_MIN_DELTA)
}

/// Fits a region around `points`.
///
/// The center is the midpoint of the min/max bounds on each axis, not the
/// mean of the points, so the result does not depend on input order or on
/// duplicated points. Each delta is `(max - min) * padding_factor`, replaced
/// by `min_delta` when the span on that axis is zero.
#[must_use]
pub fn fit_region_with(points: &[GeoPoint], padding_factor: f64, min_delta: f64) -> Option<Region> {
    let (first, rest) = points.split_first()?;

    let mut min_lat = first.latitude;
    let mut max_lat = first.latitude;
    let mut min_lng = first.longitude;
    let mut max_lng = first.longitude;

    for point in rest {
        min_lat = min_lat.min(point.latitude);
        max_lat = max_lat.max(point.latitude);
        min_lng = min_lng.min(point.longitude);
        max_lng = max_lng.max(point.longitude);
    }

    Some(Region {
        latitude: (min_lat + max_lat) / 2.0,
        longitude: (min_lng + max_lng) / 2.0,
        latitude_delta: padded_span(min_lat, max_lat, padding_factor, min_delta),
        longitude_delta: padded_span(min_lng, max_lng, padding_factor, min_delta),
    })
}

fn padded_span(min: f64, max: f64, padding_factor: f64, min_delta: f64) -> f64 {
    let span = (max - min) * padding_factor;
    if span > 0.0 {
        span
    } else {
        min_delta
    }
}
