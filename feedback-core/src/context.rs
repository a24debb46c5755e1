//! feedback-core/src/context.rs
//!
//! Explicit wiring of every component. Nothing in this crate is a global:
//! callers build one `FeedbackContext` per process (or per test) and pass the
//! pieces they need.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use feedback_common::models::{DashboardMetrics, EmployeeMetrics};
use feedback_common::traits::EmailSender;

use crate::api::SecureApiClient;
use crate::auth::{FirebaseAuth, TokenManager};
use crate::cache::{MetricsCache, Sweep};
use crate::config::Config;
use crate::email::{EmailJsClient, NoopEmailSender};
use crate::http::{HttpTransport, ReqwestTransport};
use crate::rate_limiter::RateLimiter;
use crate::services::{CouponService, FeedbackService, MetricsService};
use crate::storage::LocalStore;
use crate::tasks::{spawn_cache_sweep_task, spawn_token_refresh_task};
use crate::utils::time::{Clock, SystemClock};
use crate::Error;

pub struct FeedbackContext {
    pub config: Config,
    pub clock: Arc<dyn Clock>,
    pub store: Arc<LocalStore>,
    pub rate_limiter: Arc<RateLimiter>,
    pub firebase: Option<Arc<FirebaseAuth>>,
    pub token_manager: Option<Arc<TokenManager>>,
    pub api: Arc<SecureApiClient>,
    pub email: Arc<dyn EmailSender>,
    pub dashboard_cache: Arc<MetricsCache<DashboardMetrics>>,
    pub employee_cache: Arc<MetricsCache<Vec<EmployeeMetrics>>>,
    pub metrics: Arc<MetricsService>,
    pub coupons: Arc<CouponService>,
    pub feedback: Arc<FeedbackService>,
}

impl FeedbackContext {
    /// Production wiring: reqwest transport, system clock, file-backed store.
    pub fn new(config: Config) -> Result<Self, Error> {
        let store = Arc::new(LocalStore::open(&config.store_path)?);
        Self::with_parts(config, Arc::new(ReqwestTransport::new()), Arc::new(SystemClock), store)
    }

    pub fn with_parts(
        config: Config,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
        store: Arc<LocalStore>,
    ) -> Result<Self, Error> {
        let rate_limiter = Arc::new(RateLimiter::with_clock(config.rate_limit.clone(), Arc::clone(&clock)));

        let firebase = config.firebase_api_key.as_deref().map(|key| {
            Arc::new(FirebaseAuth::new(key, Arc::clone(&transport)).with_clock(Arc::clone(&clock)))
        });
        let token_manager = firebase
            .as_ref()
            .map(|fb| Arc::new(TokenManager::new(fb.clone())));

        let device_id = store.device_id()?;
        let mut api = SecureApiClient::new(&config.api_url, Arc::clone(&transport), Arc::clone(&rate_limiter), &device_id)?
            .with_timeout(config.request_timeout);
        if let Some(tm) = &token_manager {
            api = api.with_token_manager(Arc::clone(tm));
        }
        let api = Arc::new(api);

        let email: Arc<dyn EmailSender> = match &config.emailjs {
            Some(emailjs) => Arc::new(EmailJsClient::new(emailjs.clone(), Arc::clone(&transport))),
            None => Arc::new(NoopEmailSender),
        };

        let dashboard_cache = Arc::new(MetricsCache::with_clock(config.metrics_cache.clone(), Arc::clone(&clock)));
        let employee_cache = Arc::new(MetricsCache::with_clock(config.metrics_cache.clone(), Arc::clone(&clock)));
        let metrics = Arc::new(MetricsService::new(
            Arc::clone(&api),
            Arc::clone(&dashboard_cache),
            Arc::clone(&employee_cache),
            Arc::clone(&clock),
        ));
        let coupons = Arc::new(CouponService::new(
            Arc::clone(&api),
            Arc::clone(&email),
            Arc::clone(&clock),
            config.coupon.clone(),
        ));
        let feedback = Arc::new(
            FeedbackService::new(
                Arc::clone(&api),
                Arc::clone(&coupons),
                Arc::clone(&metrics),
                Arc::clone(&email),
                Arc::clone(&store),
                Arc::clone(&clock),
            )
            .with_alert_template(config.emailjs.as_ref().map(|e| e.alert_template_id.clone())),
        );

        info!("Feedback context ready (api={}, device={})", config.api_url, device_id);
        Ok(Self {
            config,
            clock,
            store,
            rate_limiter,
            firebase,
            token_manager,
            api,
            email,
            dashboard_cache,
            employee_cache,
            metrics,
            coupons,
            feedback,
        })
    }

    /// Token refresh (when signed-in use is configured) and cache sweeping.
    pub fn spawn_background_tasks(&self) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();
        if let Some(tm) = &self.token_manager {
            handles.push(spawn_token_refresh_task(Arc::clone(tm), self.config.token_refresh_interval));
        }
        let targets: Vec<Arc<dyn Sweep>> = vec![
            self.dashboard_cache.clone() as Arc<dyn Sweep>,
            self.employee_cache.clone() as Arc<dyn Sweep>,
            self.rate_limiter.clone() as Arc<dyn Sweep>,
        ];
        handles.push(spawn_cache_sweep_task(targets, self.config.sweep_interval));
        handles
    }
}
