// tests/auth_tests.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use chrono::Duration as ChronoDuration;
use reqwest::Method;
use serde_json::json;

use feedback_core::auth::{FirebaseAuth, IdentityProvider, TokenManager};
use feedback_core::tasks::spawn_token_refresh_task;
use feedback_core::Error;

mod test_utils;
use test_utils::helpers::*;

const IDENTITY_URL: &str = "http://identity.test/v1";
const TOKEN_URL: &str = "http://token.test/v1";

fn firebase(transport: Arc<FakeTransport>, clock: &feedback_core::ManualClock) -> FirebaseAuth {
    FirebaseAuth::new("web-key", transport)
        .with_endpoints(IDENTITY_URL, TOKEN_URL)
        .with_clock(Arc::new(clock.clone()))
}

fn sign_in_ok(transport: &FakeTransport) {
    transport.respond(
        Method::POST,
        "/v1/accounts:signInWithPassword",
        200,
        json!({
            "localId": "owner-uid",
            "email": "owner@casalola.test",
            "idToken": "id-1",
            "refreshToken": "refresh-1",
            "expiresIn": "3600"
        }),
    );
}

fn refresh_ok(transport: &FakeTransport, id_token: &'static str) {
    transport.respond(
        Method::POST,
        "/v1/token",
        200,
        json!({
            "id_token": id_token,
            "refresh_token": "refresh-2",
            "expires_in": "3600",
            "user_id": "owner-uid"
        }),
    );
}

#[tokio::test]
async fn get_token_always_forces_a_refresh() {
    let mut identity = MockIdentity::new();
    identity
        .expect_id_token()
        .withf(|force| *force)
        .times(2)
        .returning(|_| Ok(Some("fresh".to_string())));
    let tm = TokenManager::new(Arc::new(identity));

    assert_eq!(tm.get_token().await.as_deref(), Some("fresh"));
    assert_eq!(tm.get_token().await.as_deref(), Some("fresh"));
    assert_eq!(tm.cached_token().as_deref(), Some("fresh"));
}

#[tokio::test]
async fn get_token_swallows_provider_errors() {
    let mut identity = MockIdentity::new();
    identity
        .expect_current_uid()
        .returning(|| Some("owner-uid".to_string()));
    identity
        .expect_id_token()
        .returning(|_| Err(Error::Auth("TOKEN_EXPIRED".into())));
    let tm = TokenManager::new(Arc::new(identity));

    assert_eq!(tm.get_token().await, None);
    assert!(matches!(tm.try_get_token().await, Err(Error::Auth(_))));
    assert_eq!(tm.current_token().await, None);
}

#[tokio::test(start_paused = true)]
async fn refresh_loop_keeps_running_after_a_failure() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let mut identity = MockIdentity::new();
    identity
        .expect_id_token()
        .withf(|force| *force)
        .returning(move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err(Error::Auth("network unreachable".into()))
            } else {
                Ok(Some(format!("tok-{n}")))
            }
        });
    let tm = Arc::new(TokenManager::new(Arc::new(identity)));
    let handle = spawn_token_refresh_task(tm.clone(), TokenManager::REFRESH_INTERVAL);

    // nothing happens before the first interval
    tokio::time::sleep(Duration::from_secs(29 * 60)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_secs(2 * 60)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(tm.cached_token(), None);

    tokio::time::sleep(Duration::from_secs(30 * 60)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(tm.cached_token().as_deref(), Some("tok-1"));
    assert!(!handle.is_finished());
    handle.abort();
}

#[tokio::test]
async fn firebase_sign_in_stores_the_session() {
    let clock = manual_clock();
    let transport = FakeTransport::new();
    sign_in_ok(&transport);
    let auth = firebase(transport.clone(), &clock);

    assert_eq!(auth.id_token(false).await.unwrap(), None, "no session yet");

    let session = auth
        .sign_in_with_password("owner@casalola.test", "hunter2")
        .await
        .unwrap();
    assert_eq!(session.uid, "owner-uid");
    assert_eq!(session.expires_at, fixed_now() + ChronoDuration::seconds(3600));
    assert_eq!(auth.current_uid().as_deref(), Some("owner-uid"));

    let request = &transport.requests()[0];
    assert!(request.url.ends_with("/accounts:signInWithPassword?key=web-key"), "{}", request.url);
    assert_eq!(
        body_json(request),
        json!({ "email": "owner@casalola.test", "password": "hunter2", "returnSecureToken": true })
    );

    // still valid: no network round trip
    assert_eq!(auth.id_token(false).await.unwrap().as_deref(), Some("id-1"));
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn firebase_refreshes_near_expiry_or_when_forced() {
    let clock = manual_clock();
    let transport = FakeTransport::new();
    sign_in_ok(&transport);
    refresh_ok(&transport, "id-2");
    let auth = firebase(transport.clone(), &clock);
    auth.sign_in_with_password("owner@casalola.test", "hunter2").await.unwrap();

    clock.advance(ChronoDuration::seconds(3600 - 30));
    assert_eq!(auth.id_token(false).await.unwrap().as_deref(), Some("id-2"));

    let refresh = &transport.requests_to(Method::POST, "/v1/token")[0];
    assert_eq!(refresh.body.as_deref(), Some("grant_type=refresh_token&refresh_token=refresh-1"));
    assert_eq!(
        refresh.header_value("Content-Type"),
        Some("application/x-www-form-urlencoded")
    );
    let session = auth.session().unwrap();
    assert_eq!(session.refresh_token, "refresh-2");
    assert_eq!(session.email.as_deref(), Some("owner@casalola.test"));

    auth.id_token(true).await.unwrap();
    assert_eq!(transport.requests_to(Method::POST, "/v1/token").len(), 2);
}

#[tokio::test]
async fn firebase_errors_surface_as_auth_errors() {
    let clock = manual_clock();
    let transport = FakeTransport::new();
    transport.respond(
        Method::POST,
        "/v1/accounts:signInWithPassword",
        400,
        json!({ "error": { "code": 400, "message": "INVALID_PASSWORD" } }),
    );
    let auth = firebase(transport, &clock);

    let err = auth.sign_in_with_password("owner@casalola.test", "nope").await.unwrap_err();
    assert!(matches!(&err, Error::Auth(msg) if msg == "INVALID_PASSWORD"), "{err:?}");
    assert_eq!(err.status(), 401);
    assert!(auth.session().is_none());
}

#[tokio::test]
async fn token_manager_over_firebase_follows_sign_out() {
    let clock = manual_clock();
    let transport = FakeTransport::new();
    sign_in_ok(&transport);
    refresh_ok(&transport, "id-2");
    let auth = Arc::new(firebase(transport, &clock));
    let tm = TokenManager::new(auth.clone());

    assert_eq!(tm.current_token().await, None);
    auth.sign_in_with_password("owner@casalola.test", "hunter2").await.unwrap();
    assert_eq!(tm.current_token().await.as_deref(), Some("id-1"));
    assert_eq!(tm.get_token().await.as_deref(), Some("id-2"));

    auth.sign_out();
    assert_eq!(tm.cached_token().as_deref(), Some("id-2"));
    assert_eq!(tm.current_token().await, None);
    assert_eq!(tm.cached_token(), None);
    assert!(tm.provider().current_uid().is_none());
}
