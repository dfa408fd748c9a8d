use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::position::DriverPosition;
use crate::models::session::TrackingSession;
use crate::observability::metrics::Metrics;
use crate::tracking::subscription::SubscriptionHandle;
use crate::tracking::GeoTrackingService;

/// Broadcast to websocket clients on every accepted position sample.
#[derive(Debug, Clone, Serialize)]
pub struct PositionEvent {
    pub event_id: Uuid,
    pub order_id: String,
    pub driver_id: String,
    pub position: DriverPosition,
}

/// The in-process consumer of the tracking library: it owns the session
/// table and the per-order subscription handles the service itself
/// deliberately does not keep.
pub struct AppState {
    pub tracker: GeoTrackingService,
    pub sessions: DashMap<String, TrackingSession>,
    pub watchers: DashMap<String, SubscriptionHandle>,
    pub position_events_tx: broadcast::Sender<PositionEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(tracker: GeoTrackingService, event_buffer_size: usize) -> Self {
        let (position_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            tracker,
            sessions: DashMap::new(),
            watchers: DashMap::new(),
            position_events_tx,
            metrics: Metrics::new(),
        }
    }
}
