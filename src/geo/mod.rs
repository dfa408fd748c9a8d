use crate::models::point::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Great-circle distance between two points in kilometers.
///
/// The intermediate haversine term is clamped to [0, 1] so antipodal and
/// coincident points never push the square roots out of their domain.
pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine =
        (sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng).clamp(0.0, 1.0);
    let central_angle = 2.0 * haversine.sqrt().atan2((1.0 - haversine).sqrt());

    EARTH_RADIUS_KM * central_angle
}
