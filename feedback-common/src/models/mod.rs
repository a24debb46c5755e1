// File: feedback-common/src/models/mod.rs
pub mod strapi;
pub mod review;
pub mod restaurant;
pub mod coupon;
pub mod employee;
pub mod metrics;
pub mod email;

pub use strapi::{ApiResponse, Entity, Meta, Pagination, Payload, Relation};
pub use review::{ImprovementCategory, NewReview, Review, ReviewStatus, ReviewUpdate};
pub use restaurant::{Restaurant, RestaurantUpdate};
pub use coupon::{Coupon, CouponUpdate, NewCoupon};
pub use employee::{Employee, EmployeeUpdate, NewEmployee};
pub use metrics::{DashboardMetrics, EmployeeMetrics, MetricsFilter};
pub use email::EmailMessage;
