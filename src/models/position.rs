use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::point::GeoPoint;

/// One location fix for a driver. Every sample is a fresh value; callers
/// only ever hold the latest one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverPosition {
    pub location: GeoPoint,
    pub heading: Option<f64>,
    pub speed_kmh: Option<f64>,
    pub accuracy_m: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}
