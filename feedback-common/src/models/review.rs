// File: feedback-common/src/models/review.rs

use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::strapi::Relation;
use crate::traits::Validate;

/// What a customer felt could be improved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ImprovementCategory {
    Service,
    Food,
    Drinks,
    Atmosphere,
    Other,
}

impl fmt::Display for ImprovementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImprovementCategory::Service => write!(f, "service"),
            ImprovementCategory::Food => write!(f, "food"),
            ImprovementCategory::Drinks => write!(f, "drinks"),
            ImprovementCategory::Atmosphere => write!(f, "atmosphere"),
            ImprovementCategory::Other => write!(f, "other"),
        }
    }
}

impl FromStr for ImprovementCategory {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "service" => Ok(ImprovementCategory::Service),
            "food" => Ok(ImprovementCategory::Food),
            "drinks" => Ok(ImprovementCategory::Drinks),
            "atmosphere" => Ok(ImprovementCategory::Atmosphere),
            "other" => Ok(ImprovementCategory::Other),
            _ => Err(format!("Unknown improvement category: {}", s)),
        }
    }
}

/// A stored review, as returned in `Entity<Review>::attributes`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(default)]
    pub restaurant: Option<Relation>,
    #[serde(default)]
    pub employee: Option<Relation>,
    pub rating: u8,
    #[serde(default)]
    pub improvement: Option<ImprovementCategory>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub coupon_used: bool,
    #[serde(default)]
    pub google_redirect: bool,
}

impl Review {
    /// Ratings 1–3 count as negative feedback.
    pub fn is_negative(&self) -> bool {
        is_negative_rating(self.rating)
    }
}

pub fn is_negative_rating(rating: u8) -> bool {
    (1..=3).contains(&rating)
}

fn check_rating(rating: u8) -> Result<(), String> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(format!("rating {rating} out of range 1..=5"))
    }
}

impl Validate for Review {
    fn validate(&self) -> Result<(), String> {
        check_rating(self.rating)
    }
}

/// Body for creating a review.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub restaurant: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee: Option<i64>,
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub improvement: Option<ImprovementCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub google_redirect: bool,
}

impl Validate for NewReview {
    fn validate(&self) -> Result<(), String> {
        check_rating(self.rating)?;
        if self.restaurant <= 0 {
            return Err("review must reference a restaurant".into());
        }
        Ok(())
    }
}

/// Partial update; reviews are only ever touched to attach or consume a coupon.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_used: Option<bool>,
}

/// Answer of the "has this email already reviewed here recently" check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewStatus {
    pub has_reviewed_recently: bool,
    pub last_review_at: Option<DateTime<Utc>>,
}
