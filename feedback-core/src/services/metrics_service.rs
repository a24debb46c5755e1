// File: feedback-core/src/services/metrics_service.rs

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use feedback_common::models::{
    Coupon, DashboardMetrics, Employee, EmployeeMetrics, Entity, MetricsFilter, Restaurant, Review,
};

use crate::api::SecureApiClient;
use crate::cache::MetricsCache;
use crate::utils::time::Clock;
use crate::Error;

/// Dashboard numbers for a restaurant, served from the metrics cache when
/// the same restaurant was asked for with the same filter in the last 5 minutes.
pub struct MetricsService {
    api: Arc<SecureApiClient>,
    dashboard_cache: Arc<MetricsCache<DashboardMetrics>>,
    employee_cache: Arc<MetricsCache<Vec<EmployeeMetrics>>>,
    clock: Arc<dyn Clock>,
}

fn cache_key(restaurant_id: i64) -> String {
    format!("restaurant:{restaurant_id}")
}

impl MetricsService {
    pub fn new(
        api: Arc<SecureApiClient>,
        dashboard_cache: Arc<MetricsCache<DashboardMetrics>>,
        employee_cache: Arc<MetricsCache<Vec<EmployeeMetrics>>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            api,
            dashboard_cache,
            employee_cache,
            clock,
        }
    }

    pub async fn dashboard(&self, restaurant_id: i64, filter: &MetricsFilter) -> Result<DashboardMetrics, Error> {
        let key = cache_key(restaurant_id);
        let filter_key = filter.key();
        if let Some(hit) = self.dashboard_cache.get(&key, &filter_key) {
            debug!("Metrics cache hit restaurant={} filter={}", restaurant_id, filter_key);
            return Ok(hit);
        }

        let now = self.clock.now();
        let restaurant = self.api.get_restaurant(restaurant_id).await?;
        let reviews = self.api.list_all_reviews(restaurant_id, filter, now).await?;
        let coupons = self.api.list_coupons(restaurant_id, filter, now).await?;

        let metrics = compute_dashboard_metrics(&restaurant.attributes, &reviews, &coupons);
        info!(
            "Computed metrics restaurant={} filter={} reviews={} avg={:.2}",
            restaurant_id, filter_key, metrics.total_reviews, metrics.average_rating
        );
        self.dashboard_cache.set(&key, metrics.clone(), &filter_key);
        Ok(metrics)
    }

    pub async fn employee_metrics(
        &self,
        restaurant_id: i64,
        filter: &MetricsFilter,
    ) -> Result<Vec<EmployeeMetrics>, Error> {
        let key = cache_key(restaurant_id);
        let filter_key = filter.key();
        if let Some(hit) = self.employee_cache.get(&key, &filter_key) {
            return Ok(hit);
        }

        let now = self.clock.now();
        let employees = self.api.list_employees(restaurant_id).await?;
        let reviews = self.api.list_all_reviews(restaurant_id, filter, now).await?;
        let table = compute_employee_metrics(&employees, &reviews);
        self.employee_cache.set(&key, table.clone(), &filter_key);
        Ok(table)
    }

    /// Called after anything that changes a restaurant's numbers.
    pub fn invalidate(&self, restaurant_id: i64) {
        let key = cache_key(restaurant_id);
        self.dashboard_cache.invalidate(&key);
        self.employee_cache.invalidate(&key);
    }
}

fn average(sum: u64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

pub fn compute_dashboard_metrics(
    restaurant: &Restaurant,
    reviews: &[Entity<Review>],
    coupons: &[Entity<Coupon>],
) -> DashboardMetrics {
    let mut metrics = DashboardMetrics {
        taps: restaurant.taps,
        ..Default::default()
    };
    let mut rating_sum = 0u64;

    for review in reviews.iter().map(|r| &r.attributes) {
        if !(1..=5).contains(&review.rating) {
            continue;
        }
        metrics.total_reviews += 1;
        rating_sum += review.rating as u64;
        metrics.rating_distribution[(review.rating - 1) as usize] += 1;
        if review.google_redirect {
            metrics.google_redirects += 1;
        }
        if review.is_negative() {
            metrics.negative_reviews += 1;
        }
        if let Some(category) = review.improvement {
            *metrics.improvement_breakdown.entry(category).or_insert(0) += 1;
        }
    }

    metrics.average_rating = average(rating_sum, metrics.total_reviews);
    // taps is a lifetime counter, so the ratio is capped rather than filtered
    metrics.response_rate = if metrics.taps == 0 {
        0.0
    } else {
        (metrics.total_reviews as f64 / metrics.taps as f64).min(1.0)
    };
    metrics.coupons_issued = coupons.len() as u64;
    metrics.coupons_redeemed = coupons.iter().filter(|c| c.attributes.used).count() as u64;
    metrics
}

/// One row per employee (inactive ones included), sorted by review count.
pub fn compute_employee_metrics(employees: &[Entity<Employee>], reviews: &[Entity<Review>]) -> Vec<EmployeeMetrics> {
    let mut per_employee: HashMap<i64, (u64, u64, u64)> = HashMap::new();
    for review in reviews.iter().map(|r| &r.attributes) {
        let Some(employee_id) = review.employee.as_ref().and_then(|e| e.id()) else {
            continue;
        };
        let slot = per_employee.entry(employee_id).or_insert((0, 0, 0));
        slot.0 += 1;
        slot.1 += review.rating as u64;
        if review.is_negative() {
            slot.2 += 1;
        }
    }

    let mut rows: Vec<EmployeeMetrics> = employees
        .iter()
        .map(|e| {
            let (count, sum, negative) = per_employee.get(&e.id).copied().unwrap_or((0, 0, 0));
            EmployeeMetrics {
                employee_id: e.id,
                name: e.attributes.name.clone(),
                active: e.attributes.active,
                total_reviews: count,
                average_rating: average(sum, count),
                negative_reviews: negative,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.total_reviews.cmp(&a.total_reviews).then_with(|| a.name.cmp(&b.name)));
    rows
}
