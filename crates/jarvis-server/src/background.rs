//! Background tasks for the Jarvis server.
//!
//! Includes:
//! - Refreshing the Home Assistant entity cache.

use jarvis_hass::DiscoveryService;
use std::sync::Arc;
use tokio::time::{sleep, Duration};

/// Starts the discovery refresh task.
///
/// This task runs indefinitely. A failed refresh keeps the previous snapshot
/// and is retried on the next tick.
pub async fn start_discovery_refresh_task(discovery: Arc<DiscoveryService>, interval: Duration) {
    tracing::info!(
        interval_seconds = interval.as_secs(),
        "starting discovery refresh task"
    );

    loop {
        sleep(interval).await;

        match discovery.refresh().await {
            Ok(count) => {
                tracing::debug!(entities = count, "refreshed entity cache");
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to refresh entity cache");
            }
        }
    }
}
