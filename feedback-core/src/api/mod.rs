// File: feedback-core/src/api/mod.rs

pub mod client;
pub mod query;
pub mod requests;

pub use client::{RequestOptions, SecureApiClient};
pub use query::{FilterOp, StrapiQuery};
