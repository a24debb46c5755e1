// File: feedback-common/src/models/coupon.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::strapi::Relation;
use crate::traits::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub code: String,
    pub discount_percentage: u8,
    #[serde(default)]
    pub review: Option<Relation>,
    #[serde(default)]
    pub restaurant: Option<Relation>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub used: bool,
    pub expires_at: DateTime<Utc>,
}

impl Coupon {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl Validate for Coupon {
    fn validate(&self) -> Result<(), String> {
        if self.code.is_empty() || !self.code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(format!("malformed coupon code '{}'", self.code));
        }
        if self.discount_percentage == 0 || self.discount_percentage > 100 {
            return Err(format!("discount {}% out of range", self.discount_percentage));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewCoupon {
    pub code: String,
    pub discount_percentage: u8,
    pub restaurant: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub used: bool,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CouponUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<i64>,
}
