// tests/coupon_service_tests.rs

use std::sync::Arc;
use chrono::Duration;
use reqwest::Method;
use serde_json::json;

use feedback_common::models::{Entity, Restaurant};
use feedback_core::services::{CouponConfig, CouponService};
use feedback_core::Error;

mod test_utils;
use test_utils::helpers::*;

fn service(transport: Arc<FakeTransport>, mailer: MockMailer, config: CouponConfig) -> CouponService {
    let clock = manual_clock();
    let api = Arc::new(api_client(transport, &clock));
    CouponService::new(api, Arc::new(mailer), Arc::new(clock), config)
}

fn restaurant() -> Entity<Restaurant> {
    serde_json::from_value(json!({ "id": 7, "attributes": restaurant_attrs("casa-lola", 0) })).unwrap()
}

fn quiet() -> MockMailer {
    let mut mailer = MockMailer::new();
    mailer.expect_send().times(0);
    mailer
}

fn coupon_lookup(transport: &FakeTransport, used: bool, expires_in: Duration) {
    transport.respond(
        Method::GET,
        "/api/coupons",
        200,
        list(vec![(501, coupon_attrs("ABCD1234", used, fixed_now() + expires_in, Some(101)))]),
    );
}

#[tokio::test]
async fn redeem_marks_coupon_and_review_used() {
    let transport = FakeTransport::new();
    coupon_lookup(&transport, false, Duration::days(3));
    transport.respond(
        Method::PUT,
        "/api/coupons/501",
        200,
        single(501, coupon_attrs("ABCD1234", true, fixed_now() + Duration::days(3), Some(101))),
    );
    transport.respond(Method::PUT, "/api/reviews/101", 200, single(101, review_attrs(2, days_ago(1))));
    let coupons = service(transport.clone(), quiet(), CouponConfig::default());

    let redeemed = coupons.redeem(" abcd1234 ").await.unwrap();
    assert!(redeemed.attributes.used);

    let lookup = &transport.requests_to(Method::GET, "/api/coupons")[0];
    assert!(lookup.url.contains("filters[code][$eq]=ABCD1234"), "{}", lookup.url);
    assert_eq!(
        body_json(&transport.requests_to(Method::PUT, "/api/coupons/501")[0]),
        json!({ "data": { "used": true } })
    );
    assert_eq!(
        body_json(&transport.requests_to(Method::PUT, "/api/reviews/101")[0]),
        json!({ "data": { "couponUsed": true } })
    );
}

#[tokio::test]
async fn used_or_expired_coupons_are_refused() {
    let transport = FakeTransport::new();
    coupon_lookup(&transport, true, Duration::days(3));
    let coupons = service(transport.clone(), quiet(), CouponConfig::default());
    let err = coupons.redeem("ABCD1234").await.unwrap_err();
    assert!(matches!(&err, Error::Validation(msg) if msg.contains("already been used")));

    coupon_lookup(&transport, false, Duration::seconds(-1));
    let err = coupons.redeem("ABCD1234").await.unwrap_err();
    assert!(matches!(&err, Error::Validation(msg) if msg.contains("expired")));

    assert!(transport.requests_to(Method::PUT, "/api/coupons/501").is_empty());
}

#[tokio::test]
async fn unknown_code_is_not_found() {
    let transport = FakeTransport::new();
    transport.respond(Method::GET, "/api/coupons", 200, list(vec![]));
    let coupons = service(transport, quiet(), CouponConfig::default());
    assert!(matches!(coupons.redeem("NOPE").await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn issue_without_template_creates_and_links_but_sends_nothing() {
    let transport = FakeTransport::new();
    transport.on(Method::POST, "/api/coupons", |req| {
        let attrs = body_json(req)["data"].clone();
        feedback_core::HttpResponse::new(200, single(501, attrs).to_string())
    });
    transport.respond(Method::PUT, "/api/reviews/101", 200, single(101, review_attrs(2, fixed_now())));
    let config = CouponConfig {
        discount_percentage: 15,
        code_length: 10,
        ..Default::default()
    };
    let coupons = service(transport.clone(), quiet(), config);

    let coupon = coupons
        .issue_coupon(&restaurant(), 101, "guest@example.com")
        .await
        .unwrap();
    assert_eq!(coupon.attributes.code.len(), 10);
    assert_eq!(coupon.attributes.discount_percentage, 15);
    assert!(!coupon.attributes.used);
    assert_eq!(coupon.attributes.review.and_then(|r| r.id()), Some(101));

    let body = body_json(&transport.requests_to(Method::POST, "/api/coupons")[0]);
    assert_eq!(body["data"]["restaurant"], json!(7));
    assert_eq!(body["data"]["email"], json!("guest@example.com"));
}
