// File: feedback-common/src/models/restaurant.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::traits::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub name: String,
    pub slug: String,
    /// Engagement counter: one per visit of the feedback entry point (QR scan, NFC tap).
    #[serde(default)]
    pub taps: u64,
    #[serde(default)]
    pub google_maps_link: Option<String>,
    /// Identity-provider uid of the owner.
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub owner_email: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Validate for Restaurant {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("restaurant name is empty".into());
        }
        if self.slug.trim().is_empty() {
            return Err(format!("restaurant '{}' has an empty slug", self.name));
        }
        if let Some(lat) = self.latitude {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(format!("latitude {lat} out of range"));
            }
        }
        if let Some(lng) = self.longitude {
            if !(-180.0..=180.0).contains(&lng) {
                return Err(format!("longitude {lng} out of range"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taps: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_maps_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}
