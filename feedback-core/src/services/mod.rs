pub mod metrics_service;
pub mod coupon_service;
pub mod feedback_service;

pub use metrics_service::{MetricsService, compute_dashboard_metrics, compute_employee_metrics};
pub use coupon_service::{CouponConfig, CouponService, generate_coupon_code};
pub use feedback_service::{FeedbackProgress, FeedbackService, FeedbackSession, SubmissionReceipt};
