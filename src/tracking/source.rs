use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::AppError;
use crate::models::point::GeoPoint;
use crate::models::position::DriverPosition;

/// Where driver positions come from. Production wires a real provider;
/// tests inject scripted fixtures; the default is the simulated source
/// below.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn sample(&self, driver_id: &str) -> Result<DriverPosition, AppError>;
}

const MAX_JITTER_DEG: f64 = 0.0005;

/// Synthesizes fixes by jittering around a base point, with heading, speed
/// and accuracy drawn from the ranges a real urban feed would report.
pub struct SimulatedLocationSource {
    base: GeoPoint,
    rng: Mutex<StdRng>,
}

impl SimulatedLocationSource {
    pub fn new(base: GeoPoint) -> Self {
        Self {
            base,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Seeded variant for reproducible jitter in tests.
    pub fn seeded(base: GeoPoint, seed: u64) -> Self {
        Self {
            base,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

#[async_trait]
impl LocationSource for SimulatedLocationSource {
    async fn sample(&self, _driver_id: &str) -> Result<DriverPosition, AppError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| AppError::Internal("location rng lock poisoned".to_string()))?;

        Ok(DriverPosition {
            location: GeoPoint {
                lat: self.base.lat + rng.gen_range(-MAX_JITTER_DEG..=MAX_JITTER_DEG),
                lng: self.base.lng + rng.gen_range(-MAX_JITTER_DEG..=MAX_JITTER_DEG),
            },
            heading: Some(rng.gen_range(0.0..360.0)),
            speed_kmh: Some(rng.gen_range(25.0..=45.0)),
            accuracy_m: Some(rng.gen_range(3.0..=8.0)),
            recorded_at: Utc::now(),
        })
    }
}
