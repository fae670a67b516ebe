//! Periodic refresh trigger

use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use crate::engine::{RefreshRequest, RefreshService};
use crate::EngineError;

pub struct RefreshScheduler {
    service: Arc<RefreshService>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl RefreshScheduler {
    pub fn new(service: Arc<RefreshService>, interval: Duration, shutdown: CancellationToken) -> Self {
        Self { service, interval, shutdown }
    }

    /// Refreshes immediately, then every `interval` until shutdown.
    pub async fn run(self) {
        tracing::info!(interval_secs = self.interval.as_secs(), "refresh scheduler started");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    match self.service.refresh(RefreshRequest::default(), &self.shutdown).await {
                        Ok(_) | Err(EngineError::Cancelled) => {}
                        // already logged by the service; the next tick retries
                        Err(e) => tracing::debug!(error = %e, "scheduled refresh failed"),
                    }
                }
            }
        }
        tracing::info!("refresh scheduler stopped");
    }
}
