use std::env;
use std::time::Duration;

use crate::error::AppError;
use crate::tracking::TrackerConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub poll_interval_ms: u64,
    pub traffic_friction_factor: f64,
    pub min_eta_minutes: u32,
    pub provider_timeout_ms: u64,
    pub event_buffer_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            poll_interval_ms: parse_or_default("POLL_INTERVAL_MS", 3000)?,
            traffic_friction_factor: parse_or_default("TRAFFIC_FRICTION_FACTOR", 0.8)?,
            min_eta_minutes: parse_or_default("MIN_ETA_MINUTES", 1)?,
            provider_timeout_ms: parse_or_default("PROVIDER_TIMEOUT_MS", 5000)?,
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
        })
    }

    pub fn tracker(&self) -> TrackerConfig {
        TrackerConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            traffic_friction: self.traffic_friction_factor,
            min_eta_minutes: self.min_eta_minutes,
            provider_timeout: Duration::from_millis(self.provider_timeout_ms),
        }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
