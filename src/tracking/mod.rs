pub mod eta;
pub mod route;
pub mod source;
pub mod subscription;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::info;

use crate::error::AppError;
use crate::geo::haversine_km;
use crate::models::point::GeoPoint;
use crate::models::position::DriverPosition;
use crate::models::session::{TrackingSession, TrackingStatus};
use crate::tracking::source::LocationSource;
use crate::tracking::subscription::{PositionUpdate, SubscriptionHandle};

/// Pickup reference used when the order store has not supplied one yet
/// (Taipei Main Station).
pub const DEFAULT_PICKUP: GeoPoint = GeoPoint {
    lat: 25.0478,
    lng: 121.517,
};

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub poll_interval: Duration,
    pub traffic_friction: f64,
    pub min_eta_minutes: u32,
    pub provider_timeout: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(3000),
            traffic_friction: 0.8,
            min_eta_minutes: 1,
            provider_timeout: Duration::from_millis(5000),
        }
    }
}

/// Answers "where is the driver, how far, how long, and keep me updated"
/// for one order, against whatever `LocationSource` it was built with.
///
/// The service keeps no session table and no subscription registry; every
/// `TrackingSession` and `SubscriptionHandle` is owned by the caller.
#[derive(Clone)]
pub struct GeoTrackingService {
    source: Arc<dyn LocationSource>,
    config: TrackerConfig,
    pickup_reference: GeoPoint,
}

impl GeoTrackingService {
    pub fn new(
        source: Arc<dyn LocationSource>,
        config: TrackerConfig,
        pickup_reference: GeoPoint,
    ) -> Self {
        Self {
            source,
            config,
            pickup_reference,
        }
    }

    pub fn pickup_reference(&self) -> GeoPoint {
        self.pickup_reference
    }

    /// Builds the initial session snapshot for an order. No background work
    /// starts here; callers pair this with `subscribe` for live updates.
    pub async fn start_tracking(
        &self,
        order_id: &str,
        driver_id: &str,
    ) -> Result<TrackingSession, AppError> {
        if order_id.trim().is_empty() {
            return Err(AppError::InvalidInput("order id cannot be empty".to_string()));
        }

        if driver_id.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "driver id cannot be empty".to_string(),
            ));
        }

        let position = self.driver_position(driver_id).await?;
        let distance_km = haversine_km(&position.location, &self.pickup_reference);
        let eta_minutes = self.estimate_eta(&position, &self.pickup_reference)?;
        let route = route::plan(&position.location, &self.pickup_reference)?;

        info!(
            order_id = %order_id,
            driver_id = %driver_id,
            distance_km,
            eta_minutes,
            "tracking started"
        );

        Ok(TrackingSession {
            order_id: order_id.to_string(),
            driver_id: driver_id.to_string(),
            current_position: position,
            eta_minutes,
            distance_km,
            status: TrackingStatus::DriverArriving,
            route: Some(route),
            started_at: Utc::now(),
        })
    }

    /// One fresh fix from the location source, bounded by the provider
    /// timeout.
    pub async fn driver_position(&self, driver_id: &str) -> Result<DriverPosition, AppError> {
        if driver_id.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "driver id cannot be empty".to_string(),
            ));
        }

        match timeout(self.config.provider_timeout, self.source.sample(driver_id)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Unavailable(format!(
                "no position fix for driver {driver_id} within {:?}",
                self.config.provider_timeout
            ))),
        }
    }

    pub fn distance_km(&self, a: &GeoPoint, b: &GeoPoint) -> Result<f64, AppError> {
        a.validate()?;
        b.validate()?;
        Ok(haversine_km(a, b))
    }

    pub fn estimate_eta(
        &self,
        position: &DriverPosition,
        destination: &GeoPoint,
    ) -> Result<u32, AppError> {
        position.location.validate()?;
        destination.validate()?;

        let distance_km = haversine_km(&position.location, destination);
        eta::from_distance(distance_km, position.speed_kmh, &self.config)
    }

    /// Starts periodic sampling for a driver. Updates arrive on the returned
    /// channel in production order; the handle stops them from the next tick
    /// boundary onward.
    pub fn subscribe(
        &self,
        driver_id: &str,
    ) -> Result<(SubscriptionHandle, mpsc::Receiver<PositionUpdate>), AppError> {
        if driver_id.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "driver id cannot be empty".to_string(),
            ));
        }

        Ok(subscription::spawn(
            self.source.clone(),
            driver_id.to_string(),
            self.config.poll_interval,
            self.config.provider_timeout,
        ))
    }

    /// Idempotent: stopping an order that was never tracked, or stopping it
    /// twice, still acknowledges success.
    pub fn stop_tracking(&self, order_id: &str) -> String {
        info!(order_id = %order_id, "tracking stopped");
        format!("tracking stopped for order {order_id}")
    }

    pub fn route(&self, start: &GeoPoint, end: &GeoPoint) -> Result<Vec<GeoPoint>, AppError> {
        route::plan(start, end)
    }

    /// Known status codes map to canonical user-facing text; anything else
    /// gets the generic fallback rather than an error.
    pub fn status_message(&self, code: &str) -> String {
        match TrackingStatus::from_code(code) {
            Some(status) => status.message().to_string(),
            None => "Status updated".to_string(),
        }
    }
}
