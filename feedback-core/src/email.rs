// File: feedback-core/src/email.rs
//
// Transactional email through the EmailJS REST API.

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use feedback_common::models::EmailMessage;
use feedback_common::traits::EmailSender;

use crate::http::{HttpRequest, HttpTransport};
use crate::Error;

const EMAILJS_SEND_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";

/// How long a caller waits on one email before treating it as failed.
pub const EMAIL_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends through `sender`, failing with [`Error::Timeout`] once `limit` passes.
pub async fn send_bounded(sender: &dyn EmailSender, message: &EmailMessage, limit: Duration) -> Result<(), Error> {
    match tokio::time::timeout(limit, sender.send(message)).await {
        Ok(sent) => sent,
        Err(_) => Err(Error::Timeout(format!(
            "email template={} to {} not sent within {}s",
            message.template_id,
            message.to_email,
            limit.as_secs()
        ))),
    }
}

#[derive(Debug, Clone)]
pub struct EmailJsConfig {
    pub service_id: String,
    /// The account's public key (`user_id` in the API).
    pub public_key: String,
    /// Private key, required when the account enforces strict mode.
    pub private_key: Option<String>,
    pub coupon_template_id: String,
    pub alert_template_id: String,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
    template_params: &'a std::collections::BTreeMap<String, String>,
}

pub struct EmailJsClient {
    config: EmailJsConfig,
    endpoint: String,
    transport: Arc<dyn HttpTransport>,
}

impl EmailJsClient {
    pub fn new(config: EmailJsConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            config,
            endpoint: EMAILJS_SEND_URL.to_string(),
            transport,
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn config(&self) -> &EmailJsConfig {
        &self.config
    }
}

#[async_trait]
impl EmailSender for EmailJsClient {
    async fn send(&self, message: &EmailMessage) -> Result<(), Error> {
        let body = SendRequest {
            service_id: &self.config.service_id,
            template_id: &message.template_id,
            user_id: &self.config.public_key,
            access_token: self.config.private_key.as_deref(),
            template_params: &message.params,
        };
        debug!("Sending template={} to {}", message.template_id, message.to_email);

        let response = self
            .transport
            .send(HttpRequest::post(&self.endpoint).json_body(serde_json::to_string(&body)?))
            .await
            .map_err(|e| Error::Email(format!("email dispatch failed: {e}")))?;

        if !response.is_success() {
            return Err(Error::Email(format!(
                "email service answered HTTP {}: {}",
                response.status,
                response.body.trim()
            )));
        }
        info!("Email template={} delivered to {}", message.template_id, message.to_email);
        Ok(())
    }
}

/// Sender used when no email service is configured; logs and drops.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEmailSender;

#[async_trait]
impl EmailSender for NoopEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), Error> {
        info!("Email disabled; dropping template={} for {}", message.template_id, message.to_email);
        Ok(())
    }
}
