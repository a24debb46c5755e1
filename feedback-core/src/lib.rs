// src/lib.rs

pub mod http;
pub mod api;
pub mod rate_limiter;
pub mod auth;
pub mod cache;
pub mod feedback;
pub mod email;
pub mod storage;
pub mod services;
pub mod tasks;
pub mod config;
pub mod context;
pub mod utils;

pub use feedback_common::error::Error;
pub use http::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use api::{RequestOptions, SecureApiClient, StrapiQuery};
pub use rate_limiter::{RateLimiter, RateLimiterConfig};
pub use auth::{FirebaseAuth, TokenManager};
pub use cache::MetricsCache;
pub use feedback::{FeedbackStep, FeedbackWizard};
pub use config::Config;
pub use context::FeedbackContext;
pub use utils::time::{Clock, ManualClock, SystemClock};
