// File: feedback-core/src/config.rs
//
// Everything is configured through environment variables (a `.env` file is
// honoured). Only FEEDBACK_API_URL is required.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration as StdDuration;
use chrono::Duration;
use tracing::{debug, info};

use crate::cache::MetricsCacheConfig;
use crate::email::EmailJsConfig;
use crate::rate_limiter::RateLimiterConfig;
use crate::services::CouponConfig;
use crate::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub firebase_api_key: Option<String>,
    /// Service account the headless runner signs in with.
    pub firebase_email: Option<String>,
    pub firebase_password: Option<String>,
    pub emailjs: Option<EmailJsConfig>,
    pub store_path: PathBuf,
    pub request_timeout: StdDuration,
    pub token_refresh_interval: StdDuration,
    pub sweep_interval: StdDuration,
    pub rate_limit: RateLimiterConfig,
    pub metrics_cache: MetricsCacheConfig,
    pub coupon: CouponConfig,
}

impl Config {
    /// Loads `.env` (if any) and reads the process environment.
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_url = var("FEEDBACK_API_URL")
            .ok_or_else(|| Error::Config("FEEDBACK_API_URL is not set".into()))?;
        url::Url::parse(&api_url)
            .map_err(|e| Error::Config(format!("FEEDBACK_API_URL is not a valid URL: {e}")))?;

        let emailjs = match (var("EMAILJS_SERVICE_ID"), var("EMAILJS_PUBLIC_KEY")) {
            (Some(service_id), Some(public_key)) => Some(EmailJsConfig {
                service_id,
                public_key,
                private_key: var("EMAILJS_PRIVATE_KEY"),
                coupon_template_id: var("EMAILJS_COUPON_TEMPLATE_ID").unwrap_or_else(|| "coupon".into()),
                alert_template_id: var("EMAILJS_ALERT_TEMPLATE_ID").unwrap_or_else(|| "negative_review".into()),
            }),
            _ => {
                info!("EmailJS not configured; emails will be logged and dropped");
                None
            }
        };

        let rate_limit = RateLimiterConfig {
            max_requests: positive_or(&var, "RATE_LIMIT_MAX_REQUESTS", 30usize)?,
            window: Duration::seconds(positive_or(&var, "RATE_LIMIT_WINDOW_SECS", 60i64)?),
            block_duration: Duration::seconds(positive_or(&var, "RATE_LIMIT_BLOCK_SECS", 300i64)?),
            max_clients: positive_or(&var, "RATE_LIMIT_MAX_CLIENTS", 10_000usize)?,
        };

        let metrics_cache = MetricsCacheConfig {
            ttl: Duration::seconds(positive_or(&var, "METRICS_CACHE_TTL_SECS", 300i64)?),
            max_entries: positive_or(&var, "METRICS_CACHE_MAX_ENTRIES", 256usize)?,
        };

        let discount: u8 = parse_or(&var, "COUPON_DISCOUNT_PERCENT", 10u8)?;
        if discount == 0 || discount > 100 {
            return Err(Error::Config(format!("COUPON_DISCOUNT_PERCENT must be 1..=100, got {discount}")));
        }
        let coupon = CouponConfig {
            discount_percentage: discount,
            validity: Duration::days(positive_or(&var, "COUPON_VALIDITY_DAYS", 30i64)?),
            code_length: positive_or(&var, "COUPON_CODE_LENGTH", 8usize)?,
            email_template_id: emailjs.as_ref().map(|e| e.coupon_template_id.clone()),
        };

        let config = Self {
            api_url,
            firebase_api_key: var("FIREBASE_API_KEY"),
            firebase_email: var("FIREBASE_EMAIL"),
            firebase_password: var("FIREBASE_PASSWORD"),
            emailjs,
            store_path: var("FEEDBACK_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./feedback-store.json")),
            request_timeout: StdDuration::from_secs(positive_or(&var, "REQUEST_TIMEOUT_SECS", 10u64)?),
            token_refresh_interval: StdDuration::from_secs(positive_or(&var, "TOKEN_REFRESH_SECS", 30 * 60u64)?),
            sweep_interval: StdDuration::from_secs(positive_or(&var, "CACHE_SWEEP_SECS", 60u64)?),
            rate_limit,
            metrics_cache,
            coupon,
        };
        debug!("Loaded configuration for API {}", config.api_url);
        Ok(config)
    }
}

fn parse_or<T, V>(var: &V, key: &str, default: T) -> Result<T, Error>
where
    T: FromStr,
    T::Err: Display,
    V: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid {key} value '{raw}': {e}"))),
    }
}

/// Like [`parse_or`], for counts and durations that must be above zero.
fn positive_or<T, V>(var: &V, key: &str, default: T) -> Result<T, Error>
where
    T: FromStr + PartialOrd + Default + Display,
    T::Err: Display,
    V: Fn(&str) -> Option<String>,
{
    let value = parse_or(var, key, default)?;
    if value <= T::default() {
        return Err(Error::Config(format!("{key} must be greater than zero, got {value}")));
    }
    Ok(value)
}
