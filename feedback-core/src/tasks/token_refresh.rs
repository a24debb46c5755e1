// feedback-core/src/tasks/token_refresh.rs

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::auth::TokenManager;

/// Spawns a background task that forces a token refresh every `interval`
/// (30 minutes in production). Best-effort: a failure is logged and the
/// next tick simply tries again.
pub fn spawn_token_refresh_task(token_manager: Arc<TokenManager>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Token refresh task started (every {}s)", interval.as_secs());
        loop {
            ticker.tick().await;
            match tokio::time::timeout(TokenManager::REFRESH_TIMEOUT, token_manager.try_get_token()).await {
                Ok(Ok(Some(_))) => debug!("Background token refresh succeeded"),
                Ok(Ok(None)) => debug!("Background token refresh: nobody signed in"),
                Ok(Err(e)) => warn!("Background token refresh failed: {}", e),
                Err(_) => warn!(
                    "Background token refresh gave up after {}s",
                    TokenManager::REFRESH_TIMEOUT.as_secs()
                ),
            }
        }
    })
}
