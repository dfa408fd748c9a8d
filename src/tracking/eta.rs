use crate::error::AppError;
use crate::tracking::TrackerConfig;

/// Assumed speed when the position carries no speed reading. Product
/// decision: estimate with a city-traffic default instead of reporting the
/// ETA as indeterminate.
const DEFAULT_SPEED_KMH: f64 = 30.0;

/// ETA in whole minutes for covering `distance_km` at the reported speed,
/// discounted by the traffic friction factor and floored at the configured
/// minimum.
///
/// A zero effective speed cannot produce a meaningful estimate and is
/// surfaced as `Indeterminate`, never as NaN or infinity.
pub fn from_distance(
    distance_km: f64,
    speed_kmh: Option<f64>,
    config: &TrackerConfig,
) -> Result<u32, AppError> {
    let reported = speed_kmh.unwrap_or(DEFAULT_SPEED_KMH);
    let effective = reported * config.traffic_friction;

    if effective <= 0.0 {
        return Err(AppError::Indeterminate(
            "effective speed is zero, cannot estimate arrival".to_string(),
        ));
    }

    let minutes = (distance_km / effective * 60.0).ceil() as u32;
    Ok(minutes.max(config.min_eta_minutes))
}
