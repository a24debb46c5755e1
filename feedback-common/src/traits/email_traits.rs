use async_trait::async_trait;

use crate::error::Error;
use crate::models::email::EmailMessage;

/// Third-party transactional email dispatch (template + recipient + merge fields).
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), Error>;
}
