// File: feedback-core/src/api/requests/mod.rs
//
// Typed endpoint helpers, one file per Strapi collection.

pub mod restaurants;
pub mod reviews;
pub mod employees;
pub mod coupons;

/// Strapi caps `pageSize` at 100 by default.
pub const MAX_PAGE_SIZE: u32 = 100;
