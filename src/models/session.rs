use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::point::GeoPoint;
use crate::models::position::DriverPosition;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingStatus {
    DriverArriving,
    DriverArrived,
    InProgress,
    Completed,
}

impl TrackingStatus {
    /// Parses a wire status code. Unknown codes yield `None` so callers can
    /// fall back to a generic message instead of failing; the server may
    /// introduce new codes before clients update.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "driver_arriving" => Some(Self::DriverArriving),
            "driver_arrived" => Some(Self::DriverArrived),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::DriverArriving => "Driver is on the way to the pickup point",
            Self::DriverArrived => "Driver has arrived at the pickup point",
            Self::InProgress => "Trip is in progress",
            Self::Completed => "Trip completed",
        }
    }
}

/// Snapshot of one order's tracking state. Updated by replacement, not in
/// place; owned by whoever started the tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingSession {
    pub order_id: String,
    pub driver_id: String,
    pub current_position: DriverPosition,
    pub eta_minutes: u32,
    pub distance_km: f64,
    pub status: TrackingStatus,
    pub route: Option<Vec<GeoPoint>>,
    pub started_at: DateTime<Utc>,
}
