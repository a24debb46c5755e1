// tests/metrics_cache_tests.rs

use std::sync::Arc;
use chrono::Duration;

use feedback_common::models::{DashboardMetrics, MetricsFilter};
use feedback_core::cache::{MetricsCache, MetricsCacheConfig};
use feedback_core::tasks::run_sweep;
use feedback_core::cache::Sweep;
use feedback_core::ManualClock;

mod test_utils;
use test_utils::helpers::manual_clock;

fn cache(clock: &ManualClock) -> MetricsCache<DashboardMetrics> {
    MetricsCache::with_clock(MetricsCacheConfig::default(), Arc::new(clock.clone()))
}

fn sample(total: u64) -> DashboardMetrics {
    DashboardMetrics {
        total_reviews: total,
        average_rating: 4.0,
        ..Default::default()
    }
}

#[test]
fn hit_requires_matching_filter() {
    let clock = manual_clock();
    let cache = cache(&clock);
    let month = MetricsFilter::LastMonth.key();
    let week = MetricsFilter::LastWeek.key();

    cache.set("restaurant:7", sample(12), &month);
    assert_eq!(cache.get("restaurant:7", &month).map(|m| m.total_reviews), Some(12));

    assert!(cache.get("restaurant:7", &week).is_none());
    // the mismatching read evicted the entry
    assert!(cache.get("restaurant:7", &month).is_none());
    assert!(cache.is_empty());
}

#[test]
fn entry_written_for_another_filter_does_not_answer() {
    let clock = manual_clock();
    let cache = cache(&clock);
    let a = MetricsFilter::Today.key();
    let b = MetricsFilter::LastYear.key();

    assert!(cache.get("restaurant:7", &a).is_none());
    cache.set("restaurant:7", sample(5), &b);
    assert!(cache.get("restaurant:7", &a).is_none());
}

#[test]
fn entries_expire_after_five_minutes() {
    let clock = manual_clock();
    let cache = cache(&clock);
    let filter = MetricsFilter::AllTime.key();

    cache.set("restaurant:7", sample(3), &filter);
    clock.advance(Duration::minutes(4) + Duration::seconds(59));
    assert!(cache.get("restaurant:7", &filter).is_some());

    clock.advance(Duration::seconds(1));
    assert!(cache.get("restaurant:7", &filter).is_none());
    assert_eq!(cache.len(), 0);
}

#[test]
fn custom_ranges_only_match_the_same_range() {
    let clock = manual_clock();
    let cache = cache(&clock);
    let now = test_utils::helpers::fixed_now();
    let a = MetricsFilter::Custom { from: now - Duration::days(3), to: now };
    let b = MetricsFilter::Custom { from: now - Duration::days(2), to: now };

    cache.set("restaurant:1", sample(1), &a.key());
    assert!(cache.get("restaurant:1", &b.key()).is_none());
}

#[test]
fn sweep_and_eviction_bound_the_cache() {
    let clock = manual_clock();
    let cache = Arc::new(MetricsCache::with_clock(
        MetricsCacheConfig {
            ttl: Duration::minutes(5),
            max_entries: 2,
        },
        Arc::new(clock.clone()),
    ));
    let filter = MetricsFilter::LastMonth.key();

    cache.set("restaurant:1", sample(1), &filter);
    clock.advance(Duration::seconds(1));
    cache.set("restaurant:2", sample(2), &filter);
    clock.advance(Duration::seconds(1));
    cache.set("restaurant:3", sample(3), &filter);

    assert_eq!(cache.len(), 2);
    assert!(cache.get("restaurant:1", &filter).is_none(), "oldest entry is evicted first");

    clock.advance(Duration::minutes(6));
    let targets: Vec<Arc<dyn Sweep>> = vec![cache.clone() as Arc<dyn Sweep>];
    assert_eq!(run_sweep(&targets), 2);
    assert!(cache.is_empty());
}

#[test]
fn invalidate_prefix_drops_matching_keys() {
    let clock = manual_clock();
    let cache = cache(&clock);
    let filter = MetricsFilter::LastMonth.key();
    cache.set("restaurant:1", sample(1), &filter);
    cache.set("restaurant:1:employees", sample(1), &filter);
    cache.set("restaurant:2", sample(2), &filter);

    cache.invalidate_prefix("restaurant:1");
    assert_eq!(cache.len(), 1);
    assert!(cache.get("restaurant:2", &filter).is_some());
}
