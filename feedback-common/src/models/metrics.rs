// File: feedback-common/src/models/metrics.rs

use std::collections::BTreeMap;
use std::fmt;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::review::ImprovementCategory;

/// Time window the dashboard is looking at.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MetricsFilter {
    Today,
    LastWeek,
    LastMonth,
    LastYear,
    AllTime,
    Custom { from: DateTime<Utc>, to: DateTime<Utc> },
}

impl Default for MetricsFilter {
    fn default() -> Self {
        MetricsFilter::LastMonth
    }
}

impl MetricsFilter {
    /// Stable key stored next to cached metrics; two filters are the same
    /// cache-wise only if their keys are equal.
    pub fn key(&self) -> String {
        match self {
            MetricsFilter::Today => "today".to_string(),
            MetricsFilter::LastWeek => "7d".to_string(),
            MetricsFilter::LastMonth => "30d".to_string(),
            MetricsFilter::LastYear => "365d".to_string(),
            MetricsFilter::AllTime => "all".to_string(),
            MetricsFilter::Custom { from, to } => {
                format!("custom:{}-{}", from.timestamp(), to.timestamp())
            }
        }
    }

    /// Inclusive lower bound and exclusive upper bound, `None` meaning open.
    pub fn range(&self, now: DateTime<Utc>) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        match self {
            MetricsFilter::Today => {
                let start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
                (Some(start), None)
            }
            MetricsFilter::LastWeek => (Some(now - Duration::days(7)), None),
            MetricsFilter::LastMonth => (Some(now - Duration::days(30)), None),
            MetricsFilter::LastYear => (Some(now - Duration::days(365)), None),
            MetricsFilter::AllTime => (None, None),
            MetricsFilter::Custom { from, to } => (Some(*from), Some(*to)),
        }
    }
}

impl fmt::Display for MetricsFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Aggregates shown on the owner dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardMetrics {
    pub total_reviews: u64,
    pub average_rating: f64,
    /// Index 0 holds the count of 1-star reviews, index 4 the 5-star count.
    pub rating_distribution: [u64; 5],
    pub taps: u64,
    /// reviews / taps, 0.0 when there were no taps.
    pub response_rate: f64,
    pub google_redirects: u64,
    pub negative_reviews: u64,
    pub improvement_breakdown: BTreeMap<ImprovementCategory, u64>,
    pub coupons_issued: u64,
    pub coupons_redeemed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmployeeMetrics {
    pub employee_id: i64,
    pub name: String,
    pub active: bool,
    pub total_reviews: u64,
    pub average_rating: f64,
    pub negative_reviews: u64,
}
