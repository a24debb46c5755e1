// tests/context_tests.rs

use std::collections::HashMap;
use std::sync::Arc;
use reqwest::Method;

use feedback_core::storage::{LocalStore, DEVICE_ID_KEY};
use feedback_core::{Config, FeedbackContext};

mod test_utils;
use test_utils::helpers::*;

fn config(pairs: &[(&str, &str)]) -> Config {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(move |key| map.get(key).cloned()).unwrap()
}

#[tokio::test]
async fn context_wires_device_id_as_rate_limit_key() {
    let transport = FakeTransport::new();
    transport.respond(Method::GET, "/api/restaurants", 200, list(vec![(7, restaurant_attrs("casa-lola", 0))]));
    let store = Arc::new(LocalStore::in_memory());
    store.set(DEVICE_ID_KEY, &"device-42".to_string()).unwrap();

    let ctx = FeedbackContext::with_parts(
        config(&[("FEEDBACK_API_URL", BASE_URL), ("RATE_LIMIT_MAX_REQUESTS", "1")]),
        transport.clone(),
        Arc::new(manual_clock()),
        store,
    )
    .unwrap();

    assert_eq!(ctx.api.client_id(), "device-42");
    assert!(ctx.token_manager.is_none());
    ctx.api.find_restaurant_by_slug("casa-lola").await.unwrap();
    assert!(ctx.api.find_restaurant_by_slug("casa-lola").await.is_err());
    assert!(ctx.rate_limiter.is_blocked("device-42"));
}

#[tokio::test]
async fn background_tasks_follow_configuration() {
    let anonymous = FeedbackContext::with_parts(
        config(&[("FEEDBACK_API_URL", BASE_URL)]),
        FakeTransport::new(),
        Arc::new(manual_clock()),
        Arc::new(LocalStore::in_memory()),
    )
    .unwrap();
    let handles = anonymous.spawn_background_tasks();
    assert_eq!(handles.len(), 1, "cache sweep only");
    handles.iter().for_each(|h| h.abort());

    let signed_in = FeedbackContext::with_parts(
        config(&[("FEEDBACK_API_URL", BASE_URL), ("FIREBASE_API_KEY", "web-key")]),
        FakeTransport::new(),
        Arc::new(manual_clock()),
        Arc::new(LocalStore::in_memory()),
    )
    .unwrap();
    assert!(signed_in.firebase.is_some());
    assert!(signed_in.api.token_manager().is_some());
    let handles = signed_in.spawn_background_tasks();
    assert_eq!(handles.len(), 2);
    handles.iter().for_each(|h| h.abort());
}
