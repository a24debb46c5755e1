// feedback-core/src/auth/token_manager.rs

use std::sync::Arc;
use std::time::Duration;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::auth::IdentityProvider;
use crate::Error;

/// Holds the bearer token attached to API calls and keeps it fresh.
pub struct TokenManager {
    provider: Arc<dyn IdentityProvider>,
    token: RwLock<Option<String>>,
}

impl TokenManager {
    /// How often the background task forces a refresh.
    pub const REFRESH_INTERVAL: Duration = Duration::from_secs(30 * 60);
    /// Upper bound on one background refresh round trip.
    pub const REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            token: RwLock::new(None),
        }
    }

    pub fn provider(&self) -> Arc<dyn IdentityProvider> {
        Arc::clone(&self.provider)
    }

    /// Forces the provider to mint a new token and stores it.
    pub async fn try_get_token(&self) -> Result<Option<String>, Error> {
        let fresh = self.provider.id_token(true).await?;
        *self.token.write() = fresh.clone();
        Ok(fresh)
    }

    /// Same as [`Self::try_get_token`], but a failure only logs and yields `None`.
    pub async fn get_token(&self) -> Option<String> {
        match self.try_get_token().await {
            Ok(token) => token,
            Err(e) => {
                warn!("Token refresh failed: {}", e);
                None
            }
        }
    }

    /// Cached token if there is one, otherwise whatever the provider
    /// currently holds (without forcing a refresh). `None` once the
    /// provider reports nobody signed in, whatever was cached.
    pub async fn current_token(&self) -> Option<String> {
        if self.provider.current_uid().is_none() {
            if self.token.write().take().is_some() {
                debug!("Provider signed out; dropping the cached token");
            }
            return None;
        }
        if let Some(token) = self.token.read().clone() {
            return Some(token);
        }
        match self.provider.id_token(false).await {
            Ok(token) => {
                *self.token.write() = token.clone();
                token
            }
            Err(e) => {
                debug!("No token available: {}", e);
                None
            }
        }
    }

    pub fn cached_token(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// Forget the cached token (sign-out, or a 401 from the backend).
    pub fn clear(&self) {
        *self.token.write() = None;
    }
}
