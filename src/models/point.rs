use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Coordinates outside the valid degree ranges are rejected outright,
    /// never clamped.
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(AppError::InvalidInput(format!(
                "latitude {} out of range [-90, 90]",
                self.lat
            )));
        }

        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Err(AppError::InvalidInput(format!(
                "longitude {} out of range [-180, 180]",
                self.lng
            )));
        }

        Ok(())
    }
}
