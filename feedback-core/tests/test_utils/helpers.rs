// feedback-core/tests/test_utils/helpers.rs
//
// In-memory HTTP transport plus JSON fixtures shaped like the Strapi backend.

use std::sync::Arc;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use mockall::mock;
use parking_lot::Mutex;
use reqwest::Method;
use serde_json::{json, Value};

use feedback_common::models::EmailMessage;
use feedback_common::traits::{EmailSender, IdentityProvider};
use feedback_core::http::{HttpRequest, HttpResponse, HttpTransport};
use feedback_core::rate_limiter::{RateLimiter, RateLimiterConfig};
use feedback_core::{Error, ManualClock, SecureApiClient};

pub const BASE_URL: &str = "http://api.test/api";

mock! {
    pub Identity {}
    #[async_trait]
    impl IdentityProvider for Identity {
        async fn id_token(&self, force_refresh: bool) -> Result<Option<String>, Error>;
        fn current_uid(&self) -> Option<String>;
    }
}

mock! {
    pub Mailer {}
    #[async_trait]
    impl EmailSender for Mailer {
        async fn send(&self, message: &EmailMessage) -> Result<(), Error>;
    }
}

type Handler = Box<dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync>;

struct Route {
    method: Method,
    path: String,
    handler: Handler,
}

/// Routes by method + URL path (query ignored); the most recently added
/// matching route wins. Every request is recorded.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on<F>(&self, method: Method, path: &str, handler: F)
    where
        F: Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    {
        self.routes.lock().push(Route {
            method,
            path: path.to_string(),
            handler: Box::new(handler),
        });
    }

    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        let body = body.to_string();
        self.on(method, path, move |_| HttpResponse::new(status, body.clone()));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && path_of(&r.url) == path)
            .collect()
    }
}

pub fn path_of(url: &str) -> String {
    url::Url::parse(url).map(|u| u.path().to_string()).unwrap_or_default()
}

pub fn query_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.query().map(|q| q.to_string()))
        .unwrap_or_default()
}

pub fn body_json(request: &HttpRequest) -> Value {
    request
        .body
        .as_deref()
        .and_then(|b| serde_json::from_str(b).ok())
        .unwrap_or(Value::Null)
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        self.requests.lock().push(request.clone());
        let path = path_of(&request.url);
        let routes = self.routes.lock();
        let response = routes
            .iter()
            .rev()
            .find(|r| r.method == request.method && r.path == path)
            .map(|r| (r.handler)(&request))
            .unwrap_or_else(|| {
                HttpResponse::new(
                    404,
                    json!({"data": null, "error": {"status": 404, "name": "NotFoundError", "message": "Not Found"}})
                        .to_string(),
                )
            });
        Ok(response)
    }
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

pub fn manual_clock() -> ManualClock {
    ManualClock::new(fixed_now())
}

pub fn permissive_limiter(clock: &ManualClock) -> Arc<RateLimiter> {
    Arc::new(RateLimiter::with_clock(
        RateLimiterConfig {
            max_requests: 1_000,
            ..Default::default()
        },
        Arc::new(clock.clone()),
    ))
}

pub fn api_client(transport: Arc<dyn HttpTransport>, clock: &ManualClock) -> SecureApiClient {
    SecureApiClient::new(BASE_URL, transport, permissive_limiter(clock), "device-test")
        .expect("valid base url")
}

// ---- Strapi-shaped fixtures ----

pub fn single(id: i64, attributes: Value) -> Value {
    json!({ "data": { "id": id, "attributes": attributes }, "meta": {} })
}

pub fn list(items: Vec<(i64, Value)>) -> Value {
    let total = items.len();
    let data: Vec<Value> = items
        .into_iter()
        .map(|(id, attributes)| json!({ "id": id, "attributes": attributes }))
        .collect();
    json!({
        "data": data,
        "meta": { "pagination": { "page": 1, "pageSize": 100, "pageCount": 1, "total": total } }
    })
}

pub fn restaurant_attrs(slug: &str, taps: u64) -> Value {
    json!({
        "name": "Casa Lola",
        "slug": slug,
        "taps": taps,
        "googleMapsLink": "https://maps.google.com/?cid=123",
        "owner": "owner-uid",
        "ownerEmail": "owner@casalola.test",
        "latitude": 40.4168,
        "longitude": -3.7038
    })
}

pub fn review_attrs(rating: u8, created_at: DateTime<Utc>) -> Value {
    json!({
        "rating": rating,
        "createdAt": created_at.to_rfc3339(),
        "couponUsed": false,
        "googleRedirect": rating == 5
    })
}

pub fn review_with(rating: u8, created_at: DateTime<Utc>, extra: Value) -> Value {
    let mut base = review_attrs(rating, created_at);
    if let (Some(obj), Some(more)) = (base.as_object_mut(), extra.as_object()) {
        for (k, v) in more {
            obj.insert(k.clone(), v.clone());
        }
    }
    base
}

pub fn coupon_attrs(code: &str, used: bool, expires_at: DateTime<Utc>, review_id: Option<i64>) -> Value {
    json!({
        "code": code,
        "discountPercentage": 10,
        "used": used,
        "expiresAt": expires_at.to_rfc3339(),
        "review": review_id.map(|id| json!({ "data": { "id": id } })),
        "restaurant": 7
    })
}

pub fn days_ago(days: i64) -> DateTime<Utc> {
    fixed_now() - Duration::days(days)
}
