use crate::error::AppError;
use crate::models::point::GeoPoint;

/// Stand-in for a routing-graph query: start, linear midpoint, end.
///
/// Contract for any real replacement: first element equals `start`, last
/// equals `end`, at least two points, and progress toward the destination
/// is monotonic.
pub fn plan(start: &GeoPoint, end: &GeoPoint) -> Result<Vec<GeoPoint>, AppError> {
    start.validate()?;
    end.validate()?;

    let midpoint = GeoPoint {
        lat: (start.lat + end.lat) / 2.0,
        lng: (start.lng + end.lng) / 2.0,
    };

    Ok(vec![*start, midpoint, *end])
}
