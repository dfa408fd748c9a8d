use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::engine::watcher::run_position_watcher;
use crate::error::AppError;
use crate::models::point::GeoPoint;
use crate::models::position::DriverPosition;
use crate::models::session::{TrackingSession, TrackingStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tracking", post(start_tracking))
        .route("/tracking/:order_id", get(get_session).delete(stop_tracking))
        .route("/tracking/:order_id/status", patch(update_status))
        .route("/drivers/:driver_id/position", get(driver_position))
        .route("/routes", post(plan_route))
        .route("/eta", post(estimate_eta))
}

#[derive(Deserialize)]
pub struct StartTrackingRequest {
    pub order_id: String,
    pub driver_id: String,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct RouteRequest {
    pub start: GeoPoint,
    pub end: GeoPoint,
}

#[derive(Deserialize)]
pub struct EtaRequest {
    pub position: DriverPosition,
    pub destination: GeoPoint,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct RouteResponse {
    pub points: Vec<GeoPoint>,
}

#[derive(Serialize)]
pub struct EtaResponse {
    pub minutes: u32,
    pub distance_km: f64,
}

async fn start_tracking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<StartTrackingRequest>,
) -> Result<Json<TrackingSession>, AppError> {
    let session = state
        .tracker
        .start_tracking(&payload.order_id, &payload.driver_id)
        .await?;
    let (handle, updates) = state.tracker.subscribe(&payload.driver_id)?;

    // Re-starting an order replaces its previous subscription.
    if let Some((_, previous)) = state.watchers.remove(&payload.order_id) {
        previous.cancel();
    } else {
        state.metrics.active_trackings.inc();
    }

    state.watchers.insert(payload.order_id.clone(), handle);
    state
        .sessions
        .insert(payload.order_id.clone(), session.clone());

    tokio::spawn(run_position_watcher(
        state.clone(),
        payload.order_id,
        payload.driver_id,
        updates,
    ));

    Ok(Json(session))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> Result<Json<TrackingSession>, AppError> {
    let session = state
        .sessions
        .get(&order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} is not being tracked")))?;

    Ok(Json(session.value().clone()))
}

async fn stop_tracking(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> Json<MessageResponse> {
    if let Some((_, handle)) = state.watchers.remove(&order_id) {
        handle.cancel();
        state.metrics.active_trackings.dec();
    }
    state.sessions.remove(&order_id);

    let message = state.tracker.stop_tracking(&order_id);
    Json(MessageResponse { message })
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Json<MessageResponse> {
    if let Some(status) = TrackingStatus::from_code(&payload.status) {
        if let Some(mut session) = state.sessions.get_mut(&order_id) {
            session.status = status;
        }
    }

    let message = state.tracker.status_message(&payload.status);
    Json(MessageResponse { message })
}

async fn driver_position(
    State(state): State<Arc<AppState>>,
    Path(driver_id): Path<String>,
) -> Result<Json<DriverPosition>, AppError> {
    let start = Instant::now();

    match state.tracker.driver_position(&driver_id).await {
        Ok(position) => {
            state
                .metrics
                .position_fetch_seconds
                .with_label_values(&["success"])
                .observe(start.elapsed().as_secs_f64());

            if let Some(speed) = position.speed_kmh {
                state
                    .metrics
                    .driver_speed_kmh
                    .with_label_values(&[&driver_id])
                    .set(speed);
            }

            Ok(Json(position))
        }
        Err(err) => {
            state
                .metrics
                .position_fetch_seconds
                .with_label_values(&["error"])
                .observe(start.elapsed().as_secs_f64());
            Err(err)
        }
    }
}

async fn plan_route(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RouteRequest>,
) -> Result<Json<RouteResponse>, AppError> {
    let points = state.tracker.route(&payload.start, &payload.end)?;
    Ok(Json(RouteResponse { points }))
}

async fn estimate_eta(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EtaRequest>,
) -> Result<Json<EtaResponse>, AppError> {
    let minutes = state
        .tracker
        .estimate_eta(&payload.position, &payload.destination)?;
    let distance_km = state
        .tracker
        .distance_km(&payload.position.location, &payload.destination)?;

    Ok(Json(EtaResponse {
        minutes,
        distance_km,
    }))
}
