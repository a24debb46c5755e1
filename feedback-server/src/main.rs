// feedback-server/src/main.rs
//
// Headless runner: wires the feedback stack from the environment, signs the
// service account in, keeps its token fresh and sweeps caches until Ctrl+C.
// With FEEDBACK_RESTAURANT_ID set it also logs a dashboard snapshot at startup.

use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use feedback_common::models::MetricsFilter;
use feedback_core::{Config, FeedbackContext};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("feedback_core=info,feedback_server=info"));
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub)
        .expect("Failed to set global subscriber");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env()?;
    info!("Feedback runner starting. api={}", config.api_url);
    let ctx = Arc::new(FeedbackContext::new(config)?);

    sign_in(&ctx).await;
    let handles = ctx.spawn_background_tasks();

    if let Some(restaurant_id) = std::env::var("FEEDBACK_RESTAURANT_ID")
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
    {
        log_snapshot(&ctx, restaurant_id).await;
    }

    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C, shutting down");
    for handle in handles {
        handle.abort();
    }
    Ok(())
}

async fn sign_in(ctx: &FeedbackContext) {
    let (Some(firebase), Some(email), Some(password)) = (
        ctx.firebase.as_ref(),
        ctx.config.firebase_email.as_deref(),
        ctx.config.firebase_password.as_deref(),
    ) else {
        warn!("No service account configured; running with anonymous access only");
        return;
    };
    match firebase.sign_in_with_password(email, password).await {
        Ok(session) => {
            info!("Signed in as uid={}", session.uid);
            if let Some(tm) = &ctx.token_manager {
                tm.get_token().await;
            }
        }
        Err(e) => error!("Sign-in failed: {}", e),
    }
}

async fn log_snapshot(ctx: &FeedbackContext, restaurant_id: i64) {
    match ctx.metrics.dashboard(restaurant_id, &MetricsFilter::LastMonth).await {
        Ok(m) => info!(
            "restaurant={} reviews={} avg={:.2} taps={} response_rate={:.1}% coupons={}/{}",
            restaurant_id,
            m.total_reviews,
            m.average_rating,
            m.taps,
            m.response_rate * 100.0,
            m.coupons_redeemed,
            m.coupons_issued
        ),
        Err(e) => error!("Dashboard snapshot failed: {}", e.user_message()),
    }
    match ctx.metrics.employee_metrics(restaurant_id, &MetricsFilter::LastMonth).await {
        Ok(rows) => {
            for row in rows {
                info!(
                    "  employee={} reviews={} avg={:.2} negative={}",
                    row.name, row.total_reviews, row.average_rating, row.negative_reviews
                );
            }
        }
        Err(e) => error!("Employee metrics failed: {}", e.user_message()),
    }
}
