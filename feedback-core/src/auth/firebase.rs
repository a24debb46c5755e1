// File: feedback-core/src/auth/firebase.rs
//
// Email/password sign-in and ID-token refresh against the Firebase Auth REST API.

use std::sync::Arc;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::auth::IdentityProvider;
use crate::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::utils::time::{Clock, SystemClock};
use crate::Error;

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";

/// A refresh is done this long before the token would actually expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct FirebaseSession {
    pub uid: String,
    pub email: Option<String>,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct FirebaseErrorBody {
    error: FirebaseErrorDetail,
}

#[derive(Debug, Deserialize)]
struct FirebaseErrorDetail {
    message: String,
}

pub struct FirebaseAuth {
    api_key: String,
    identity_url: String,
    token_url: String,
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    session: RwLock<Option<FirebaseSession>>,
}

impl FirebaseAuth {
    pub fn new(api_key: &str, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            api_key: api_key.to_string(),
            identity_url: IDENTITY_TOOLKIT_URL.to_string(),
            token_url: SECURE_TOKEN_URL.to_string(),
            transport,
            clock: Arc::new(SystemClock),
            session: RwLock::new(None),
        }
    }

    /// Point at an emulator or a fake server.
    pub fn with_endpoints(mut self, identity_url: &str, token_url: &str) -> Self {
        self.identity_url = identity_url.trim_end_matches('/').to_string();
        self.token_url = token_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn session(&self) -> Option<FirebaseSession> {
        self.session.read().clone()
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<FirebaseSession, Error> {
        let url = format!("{}/accounts:signInWithPassword?key={}", self.identity_url, self.api_key);
        let body = json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });
        let response = self
            .transport
            .send(HttpRequest::post(url).json_body(body.to_string()))
            .await?;
        let parsed: SignInResponse = decode_auth_response(response)?;

        let session = FirebaseSession {
            uid: parsed.local_id,
            email: parsed.email,
            id_token: parsed.id_token,
            refresh_token: parsed.refresh_token,
            expires_at: self.clock.now() + parse_expires_in(&parsed.expires_in)?,
        };
        info!("Signed in uid={}", session.uid);
        *self.session.write() = Some(session.clone());
        Ok(session)
    }

    pub fn sign_out(&self) {
        if let Some(session) = self.session.write().take() {
            info!("Signed out uid={}", session.uid);
        }
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<FirebaseSession, Error> {
        let url = format!("{}/token?key={}", self.token_url, self.api_key);
        let form = format!(
            "grant_type=refresh_token&refresh_token={}",
            urlencoding::encode(refresh_token)
        );
        let mut request = HttpRequest::post(url).header("Content-Type", "application/x-www-form-urlencoded");
        request.body = Some(form);

        let response = self.transport.send(request).await?;
        let parsed: RefreshResponse = decode_auth_response(response)?;

        let email = self.session.read().as_ref().and_then(|s| s.email.clone());
        let session = FirebaseSession {
            uid: parsed.user_id,
            email,
            id_token: parsed.id_token,
            refresh_token: parsed.refresh_token,
            expires_at: self.clock.now() + parse_expires_in(&parsed.expires_in)?,
        };
        *self.session.write() = Some(session.clone());
        Ok(session)
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    async fn id_token(&self, force_refresh: bool) -> Result<Option<String>, Error> {
        let Some(current) = self.session() else {
            return Ok(None);
        };

        let still_valid = current.expires_at - Duration::seconds(EXPIRY_MARGIN_SECS) > self.clock.now();
        if still_valid && !force_refresh {
            return Ok(Some(current.id_token));
        }

        match self.refresh_session(&current.refresh_token).await {
            Ok(session) => Ok(Some(session.id_token)),
            Err(e) => {
                warn!("Failed to refresh ID token for uid={}: {}", current.uid, e);
                Err(e)
            }
        }
    }

    fn current_uid(&self) -> Option<String> {
        self.session.read().as_ref().map(|s| s.uid.clone())
    }
}

fn decode_auth_response<T: serde::de::DeserializeOwned>(response: HttpResponse) -> Result<T, Error> {
    if !response.is_success() {
        let message = serde_json::from_str::<FirebaseErrorBody>(&response.body)
            .map(|b| b.error.message)
            .unwrap_or_else(|_| format!("HTTP {}", response.status));
        return Err(Error::Auth(message));
    }
    serde_json::from_str(&response.body).map_err(|e| Error::Auth(format!("malformed auth response: {e}")))
}

fn parse_expires_in(raw: &str) -> Result<Duration, Error> {
    raw.trim()
        .parse::<i64>()
        .map(Duration::seconds)
        .map_err(|_| Error::Auth(format!("invalid expiresIn '{raw}'")))
}
