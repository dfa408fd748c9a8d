use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::geo::haversine_km;
use crate::state::{AppState, PositionEvent};
use crate::tracking::subscription::PositionUpdate;

/// Consumes one order's subscription stream: refreshes the stored session,
/// publishes position events for websocket clients, and records metrics.
///
/// A failed sample leaves the session at its last known position so the UI
/// shows stale-but-present data instead of a blank map.
pub async fn run_position_watcher(
    state: Arc<AppState>,
    order_id: String,
    driver_id: String,
    mut updates: mpsc::Receiver<PositionUpdate>,
) {
    info!(order_id = %order_id, driver_id = %driver_id, "position watcher started");

    while let Some(update) = updates.recv().await {
        match update {
            PositionUpdate::Position(position) => {
                state
                    .metrics
                    .position_samples_total
                    .with_label_values(&["success"])
                    .inc();

                if let Some(speed) = position.speed_kmh {
                    state
                        .metrics
                        .driver_speed_kmh
                        .with_label_values(&[&driver_id])
                        .set(speed);
                }

                let destination = state.tracker.pickup_reference();
                let distance_km = haversine_km(&position.location, &destination);
                let eta_minutes = match state.tracker.estimate_eta(&position, &destination) {
                    Ok(minutes) => Some(minutes),
                    Err(err) => {
                        warn!(order_id = %order_id, error = %err, "keeping previous eta");
                        None
                    }
                };

                if let Some(mut session) = state.sessions.get_mut(&order_id) {
                    session.current_position = position.clone();
                    session.distance_km = distance_km;
                    if let Some(minutes) = eta_minutes {
                        session.eta_minutes = minutes;
                    }
                }

                let _ = state.position_events_tx.send(PositionEvent {
                    event_id: Uuid::new_v4(),
                    order_id: order_id.clone(),
                    driver_id: driver_id.clone(),
                    position,
                });
            }
            PositionUpdate::SampleFailed(reason) => {
                state
                    .metrics
                    .position_samples_total
                    .with_label_values(&["error"])
                    .inc();
                warn!(
                    order_id = %order_id,
                    driver_id = %driver_id,
                    reason = %reason,
                    "dropped position sample, keeping last known position"
                );
            }
        }
    }

    info!(order_id = %order_id, "position watcher stopped");
}
