use async_trait::async_trait;

use crate::error::Error;

/// Source of bearer tokens for the REST backend.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns the signed-in user's ID token, or `None` when nobody is
    /// signed in. With `force_refresh` the provider must mint a new token
    /// even if the cached one is still valid.
    async fn id_token(&self, force_refresh: bool) -> Result<Option<String>, Error>;

    /// Identity-provider uid of the signed-in user, if any.
    fn current_uid(&self) -> Option<String>;
}
