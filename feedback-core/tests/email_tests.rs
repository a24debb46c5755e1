// tests/email_tests.rs

use chrono::{TimeZone, Utc};
use reqwest::Method;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

use feedback_common::models::EmailMessage;
use feedback_common::traits::EmailSender;
use feedback_core::email::{EmailJsClient, EmailJsConfig, NoopEmailSender};
use feedback_core::Error;

mod test_utils;
use test_utils::helpers::*;

const ENDPOINT: &str = "http://emailjs.test/api/v1.0/email/send";

fn config(private_key: Option<&str>) -> EmailJsConfig {
    EmailJsConfig {
        service_id: "service_main".into(),
        public_key: "pk_live".into(),
        private_key: private_key.map(String::from),
        coupon_template_id: "coupon".into(),
        alert_template_id: "negative_review".into(),
    }
}

fn coupon_message() -> EmailMessage {
    EmailMessage::coupon(
        "coupon",
        "guest@example.com",
        "Casa Lola",
        "ABCD1234",
        10,
        Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap(),
    )
}

#[tokio::test]
async fn sends_template_and_params_to_emailjs() {
    let transport = FakeTransport::new();
    transport.respond(Method::POST, "/api/v1.0/email/send", 200, json!("OK"));
    let client = EmailJsClient::new(config(Some("sk_secret")), transport.clone()).with_endpoint(ENDPOINT);

    assert_ok!(client.send(&coupon_message()).await);

    let request = &transport.requests()[0];
    assert_eq!(request.url, ENDPOINT);
    assert_eq!(
        body_json(request),
        json!({
            "service_id": "service_main",
            "template_id": "coupon",
            "user_id": "pk_live",
            "accessToken": "sk_secret",
            "template_params": {
                "to_email": "guest@example.com",
                "restaurant_name": "Casa Lola",
                "coupon_code": "ABCD1234",
                "discount": "10%",
                "expires_at": "2024-07-15"
            }
        })
    );
}

#[tokio::test]
async fn access_token_is_omitted_without_a_private_key() {
    let transport = FakeTransport::new();
    transport.respond(Method::POST, "/api/v1.0/email/send", 200, json!("OK"));
    let client = EmailJsClient::new(config(None), transport.clone()).with_endpoint(ENDPOINT);

    assert_ok!(client.send(&coupon_message()).await);
    let body = body_json(&transport.requests()[0]);
    assert!(body.get("accessToken").is_none());
}

#[tokio::test]
async fn rejected_send_is_an_email_error() {
    let transport = FakeTransport::new();
    transport.respond(Method::POST, "/api/v1.0/email/send", 400, json!("The template ID is invalid"));
    let client = EmailJsClient::new(config(None), transport).with_endpoint(ENDPOINT);

    let err = assert_err!(client.send(&coupon_message()).await);
    assert!(matches!(&err, Error::Email(msg) if msg.contains("HTTP 400")), "{err:?}");
}

#[tokio::test]
async fn noop_sender_accepts_everything() {
    let alert = EmailMessage::negative_review_alert(
        "negative_review",
        "owner@casalola.test",
        "Casa Lola",
        2,
        Some("food"),
        None,
        Some("guest@example.com"),
    );
    assert_eq!(alert.params.get("comment").map(String::as_str), Some("-"));
    assert_ok!(NoopEmailSender.send(&alert).await);
}
