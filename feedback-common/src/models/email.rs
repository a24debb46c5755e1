// File: feedback-common/src/models/email.rs

use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One templated email: which template, who gets it, and the merge fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailMessage {
    pub template_id: String,
    pub to_email: String,
    pub params: BTreeMap<String, String>,
}

impl EmailMessage {
    pub fn new(template_id: &str, to_email: &str) -> Self {
        let mut params = BTreeMap::new();
        params.insert("to_email".to_string(), to_email.to_string());
        Self {
            template_id: template_id.to_string(),
            to_email: to_email.to_string(),
            params,
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Discount code sent to a customer who left negative feedback.
    pub fn coupon(
        template_id: &str,
        to_email: &str,
        restaurant_name: &str,
        code: &str,
        discount_percentage: u8,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self::new(template_id, to_email)
            .with_param("restaurant_name", restaurant_name)
            .with_param("coupon_code", code)
            .with_param("discount", format!("{discount_percentage}%"))
            .with_param("expires_at", expires_at.format("%Y-%m-%d").to_string())
    }

    /// Heads-up for the owner that a low rating just came in.
    pub fn negative_review_alert(
        template_id: &str,
        owner_email: &str,
        restaurant_name: &str,
        rating: u8,
        improvement: Option<&str>,
        comment: Option<&str>,
        customer_email: Option<&str>,
    ) -> Self {
        Self::new(template_id, owner_email)
            .with_param("restaurant_name", restaurant_name)
            .with_param("rating", rating.to_string())
            .with_param("improvement", improvement.unwrap_or("-"))
            .with_param("comment", comment.unwrap_or("-"))
            .with_param("customer_email", customer_email.unwrap_or("-"))
    }
}
