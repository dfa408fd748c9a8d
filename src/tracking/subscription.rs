use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, warn};

use crate::tracking::source::LocationSource;
use crate::models::position::DriverPosition;

const UPDATE_BUFFER: usize = 32;

/// One delivery on a subscription channel. Failed samples are surfaced on
/// the same channel instead of swallowed; the stream keeps going.
#[derive(Debug, Clone)]
pub enum PositionUpdate {
    Position(DriverPosition),
    SampleFailed(String),
}

/// Cancellation token for one subscription. Cancelling stops deliveries
/// from the next tick boundary; an in-flight delivery is not retracted.
/// Cancelling twice is a no-op.
pub struct SubscriptionHandle {
    cancel_tx: watch::Sender<bool>,
}

impl SubscriptionHandle {
    pub fn cancel(&self) {
        // The sampling task may already be gone; nothing to report then.
        let _ = self.cancel_tx.send(true);
    }
}

pub(crate) fn spawn(
    source: Arc<dyn LocationSource>,
    driver_id: String,
    poll_interval: Duration,
    sample_timeout: Duration,
) -> (SubscriptionHandle, mpsc::Receiver<PositionUpdate>) {
    let (update_tx, update_rx) = mpsc::channel(UPDATE_BUFFER);
    let (cancel_tx, mut cancel_rx) = watch::channel(false);

    tokio::spawn(async move {
        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel_rx.changed() => {
                    debug!(driver_id = %driver_id, "position subscription cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    let update = match timeout(sample_timeout, source.sample(&driver_id)).await {
                        Ok(Ok(position)) => PositionUpdate::Position(position),
                        Ok(Err(err)) => {
                            warn!(driver_id = %driver_id, error = %err, "position sample failed, skipping tick");
                            PositionUpdate::SampleFailed(err.to_string())
                        }
                        Err(_) => {
                            warn!(driver_id = %driver_id, "position sample timed out, skipping tick");
                            PositionUpdate::SampleFailed(format!(
                                "sample timed out after {sample_timeout:?}"
                            ))
                        }
                    };

                    if update_tx.send(update).await.is_err() {
                        debug!(driver_id = %driver_id, "subscriber went away, stopping sampling");
                        break;
                    }
                }
            }
        }
    });

    (SubscriptionHandle { cancel_tx }, update_rx)
}
