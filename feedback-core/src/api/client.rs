// File: feedback-core/src/api/client.rs

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use dashmap::DashMap;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use feedback_common::models::Payload;
use feedback_common::traits::Validate;

use crate::api::query::StrapiQuery;
use crate::auth::TokenManager;
use crate::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::rate_limiter::RateLimiter;
use crate::Error;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-call knobs for [`SecureApiClient::fetch`].
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub query: Option<StrapiQuery>,
    pub body: Option<String>,
    pub headers: Vec<(String, String)>,
    /// Public endpoints (the feedback page) are called without a bearer token.
    pub anonymous: bool,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            query: None,
            body: None,
            headers: Vec::new(),
            anonymous: false,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    /// POST wrapping `data` in the `{ "data": .. }` envelope.
    pub fn post<B: Serialize>(data: &B) -> Result<Self, Error> {
        Self::new(Method::POST).with_payload(data)
    }

    pub fn put<B: Serialize>(data: &B) -> Result<Self, Error> {
        Self::new(Method::PUT).with_payload(data)
    }

    pub fn with_payload<B: Serialize>(mut self, data: &B) -> Result<Self, Error> {
        self.body = Some(serde_json::to_string(&Payload::new(data))?);
        Ok(self)
    }

    pub fn query(mut self, query: StrapiQuery) -> Self {
        self.query = Some(query);
        self
    }

    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.push((key.to_string(), value.into()));
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }
}

#[derive(Debug, Deserialize)]
struct StrapiErrorBody {
    error: Option<StrapiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct StrapiErrorDetail {
    #[serde(default)]
    name: Option<String>,
    message: String,
}

struct InFlight {
    request_id: u64,
    cancel: CancellationToken,
}

/// Gateway to the REST backend: rate-limit gate, bearer token, one
/// outstanding request per endpoint, timeout, schema-checked decoding.
pub struct SecureApiClient {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    rate_limiter: Arc<RateLimiter>,
    token_manager: Option<Arc<TokenManager>>,
    client_id: String,
    timeout: Duration,
    in_flight: DashMap<String, InFlight>,
    next_request_id: AtomicU64,
}

impl SecureApiClient {
    pub fn new(
        base_url: &str,
        transport: Arc<dyn HttpTransport>,
        rate_limiter: Arc<RateLimiter>,
        client_id: &str,
    ) -> Result<Self, Error> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid API base URL '{base_url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config(format!("unsupported API URL scheme '{}'", parsed.scheme())));
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            rate_limiter,
            token_manager: None,
            client_id: client_id.to_string(),
            timeout: DEFAULT_TIMEOUT,
            in_flight: DashMap::new(),
            next_request_id: AtomicU64::new(1),
        })
    }

    pub fn with_token_manager(mut self, token_manager: Arc<TokenManager>) -> Self {
        self.token_manager = Some(token_manager);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn token_manager(&self) -> Option<&Arc<TokenManager>> {
        self.token_manager.as_ref()
    }

    /// Number of requests currently awaiting an answer.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Performs one call and decodes the answer into `T`.
    ///
    /// A newer call to the same `endpoint` aborts this one (last call wins).
    /// A 401 on an authenticated call forces one token refresh and one retry.
    /// Token acquisition, the send and the retry share one deadline.
    pub async fn fetch<T>(&self, endpoint: &str, options: RequestOptions) -> Result<T, Error>
    where
        T: DeserializeOwned + Validate,
    {
        if !self.rate_limiter.check_limit(&self.client_id) {
            warn!("Rate limit rejected {} {} for client={}", options.method, endpoint, self.client_id);
            return Err(Error::RateLimited(self.client_id.clone()));
        }

        let deadline = Instant::now() + self.timeout;
        let token = match (&self.token_manager, options.anonymous) {
            (Some(tm), false) => self.within_deadline(deadline, endpoint, tm.current_token()).await?,
            _ => None,
        };
        let mut response = self.send_once(endpoint, &options, token.as_deref(), deadline).await?;

        if response.status == 401 && token.is_some() {
            if let Some(tm) = &self.token_manager {
                debug!("401 from {}; forcing a token refresh and retrying once", endpoint);
                let fresh = self.within_deadline(deadline, endpoint, tm.get_token()).await?;
                if fresh.is_some() {
                    response = self.send_once(endpoint, &options, fresh.as_deref(), deadline).await?;
                } else {
                    tm.clear();
                }
            }
        }

        if !response.is_success() {
            let message = error_message(&response);
            warn!("{} {} failed with HTTP {}: {}", options.method, endpoint, response.status, message);
            return Err(Error::Api {
                status: response.status,
                message,
            });
        }

        decode_validated(endpoint, &response.body)
    }

    async fn within_deadline<F: Future>(&self, deadline: Instant, endpoint: &str, work: F) -> Result<F::Output, Error> {
        tokio::time::timeout_at(deadline, work)
            .await
            .map_err(|_| self.timed_out(endpoint))
    }

    fn timed_out(&self, endpoint: &str) -> Error {
        Error::Timeout(format!("{} did not answer within {}s", endpoint, self.timeout.as_secs()))
    }

    async fn send_once(
        &self,
        endpoint: &str,
        options: &RequestOptions,
        token: Option<&str>,
        deadline: Instant,
    ) -> Result<HttpResponse, Error> {
        let mut request = HttpRequest::new(options.method.clone(), self.url_for(endpoint, options.query.as_ref()))
            .header("Accept", "application/json");
        for (key, value) in &options.headers {
            request = request.header(key, value.clone());
        }
        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        if let Some(body) = &options.body {
            request = request.json_body(body.clone());
        }

        let (request_id, cancel) = self.register(endpoint);
        let outcome = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Request {} to {} superseded by a newer one", request_id, endpoint);
                Err(Error::Aborted(endpoint.to_string()))
            }
            result = self.within_deadline(deadline, endpoint, self.transport.send(request)) => {
                result.and_then(|sent| sent)
            }
        };
        self.release(endpoint, request_id);
        outcome
    }

    /// Registers a new in-flight request, cancelling the previous one for the same endpoint.
    fn register(&self, endpoint: &str) -> (u64, CancellationToken) {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let previous = self.in_flight.insert(
            endpoint.to_string(),
            InFlight {
                request_id,
                cancel: cancel.clone(),
            },
        );
        if let Some(previous) = previous {
            previous.cancel.cancel();
        }
        (request_id, cancel)
    }

    fn release(&self, endpoint: &str, request_id: u64) {
        self.in_flight.remove_if(endpoint, |_, f| f.request_id == request_id);
    }

    fn url_for(&self, endpoint: &str, query: Option<&StrapiQuery>) -> String {
        let path = endpoint.trim_start_matches('/');
        match query {
            Some(q) if !q.is_empty() => format!("{}/{}?{}", self.base_url, path, q.to_query_string()),
            _ => format!("{}/{}", self.base_url, path),
        }
    }
}

fn error_message(response: &HttpResponse) -> String {
    if let Ok(body) = serde_json::from_str::<StrapiErrorBody>(&response.body) {
        if let Some(detail) = body.error {
            return match detail.name {
                Some(name) => format!("{name}: {}", detail.message),
                None => detail.message,
            };
        }
    }
    let trimmed = response.body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", response.status)
    } else {
        trimmed.chars().take(200).collect()
    }
}

/// Decodes `body` into `T` and runs its structural checks. Any mismatch is
/// reported as [`Error::Schema`] with the JSON path of the offending field.
pub fn decode_validated<T>(endpoint: &str, body: &str) -> Result<T, Error>
where
    T: DeserializeOwned + Validate,
{
    let mut de = serde_json::Deserializer::from_str(body);
    let value: T = serde_path_to_error::deserialize(&mut de)
        .map_err(|e| Error::Schema(format!("{endpoint}: {e}")))?;
    value
        .validate()
        .map_err(|e| Error::Schema(format!("{endpoint}: {e}")))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedback_common::models::{ApiResponse, Entity, Review};

    #[test]
    fn schema_errors_name_the_offending_path() {
        let body = r#"{"data":[{"id":1,"attributes":{"rating":"five","createdAt":"2024-01-01T00:00:00Z"}}]}"#;
        let err = decode_validated::<ApiResponse<Vec<Entity<Review>>>>("/reviews", body).unwrap_err();
        match err {
            Error::Schema(msg) => assert!(msg.contains("data[0].attributes.rating"), "{msg}"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        let body = r#"{"data":{"id":3,"attributes":{"rating":9,"createdAt":"2024-01-01T00:00:00Z"}}}"#;
        let err = decode_validated::<ApiResponse<Entity<Review>>>("/reviews/3", body).unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn strapi_error_bodies_are_summarised() {
        let resp = HttpResponse::new(
            400,
            r#"{"data":null,"error":{"status":400,"name":"ValidationError","message":"rating must be at most 5"}}"#,
        );
        assert_eq!(error_message(&resp), "ValidationError: rating must be at most 5");
        assert_eq!(error_message(&HttpResponse::new(502, "")), "HTTP 502");
    }
}
