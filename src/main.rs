mod api;
mod config;
mod engine;
mod error;
mod geo;
mod models;
mod observability;
mod state;
mod tracking;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::models::point::GeoPoint;
use crate::tracking::source::SimulatedLocationSource;
use crate::tracking::{GeoTrackingService, DEFAULT_PICKUP};

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    let config = config::Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    // Simulated drivers start around Songshan Airport and are tracked
    // toward the default pickup at Taipei Main Station.
    let driver_area = GeoPoint {
        lat: 25.0697,
        lng: 121.5522,
    };
    let source = Arc::new(SimulatedLocationSource::new(driver_area));
    let tracker = GeoTrackingService::new(source, config.tracker(), DEFAULT_PICKUP);

    let shared_state = Arc::new(state::AppState::new(tracker, config.event_buffer_size));
    let app = api::rest::router(shared_state.clone());

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| error::AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| error::AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
