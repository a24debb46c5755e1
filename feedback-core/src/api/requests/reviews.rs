//! REST ⟶ /reviews

use chrono::{DateTime, Duration, Utc};
use feedback_common::models::{
    ApiResponse, Entity, MetricsFilter, NewReview, Review, ReviewStatus, ReviewUpdate,
};
use feedback_common::traits::Validate;

use crate::api::client::{RequestOptions, SecureApiClient};
use crate::api::query::StrapiQuery;
use crate::Error;

/// Window of the "one review per email per restaurant" rule.
pub const REVIEW_COOLDOWN_HOURS: i64 = 24;

impl SecureApiClient {
    /// One page of a restaurant's reviews, newest first.
    pub async fn list_reviews(
        &self,
        restaurant_id: i64,
        filter: &MetricsFilter,
        now: DateTime<Utc>,
        page: u32,
        page_size: u32,
    ) -> Result<ApiResponse<Vec<Entity<Review>>>, Error> {
        let (from, to) = filter.range(now);
        let query = StrapiQuery::new()
            .eq("restaurant.id", restaurant_id)
            .time_range("createdAt", from, to)
            .sort("createdAt:desc")
            .page(page, page_size.min(super::MAX_PAGE_SIZE))
            .populate("employee");
        self.fetch("/reviews", RequestOptions::get().query(query)).await
    }

    /// Walks every page of [`Self::list_reviews`].
    pub async fn list_all_reviews(
        &self,
        restaurant_id: i64,
        filter: &MetricsFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<Entity<Review>>, Error> {
        let mut all = Vec::new();
        let mut page = 1;
        loop {
            let resp = self
                .list_reviews(restaurant_id, filter, now, page, super::MAX_PAGE_SIZE)
                .await?;
            let received = resp.data.len();
            all.extend(resp.data);
            let page_count = resp
                .meta
                .and_then(|m| m.pagination)
                .map(|p| p.page_count)
                .unwrap_or(page);
            if page >= page_count || received == 0 {
                break;
            }
            page += 1;
        }
        Ok(all)
    }

    pub async fn create_review(&self, review: &NewReview) -> Result<Entity<Review>, Error> {
        review.validate().map_err(Error::Validation)?;
        let resp: ApiResponse<Entity<Review>> = self
            .fetch("/reviews", RequestOptions::post(review)?.anonymous())
            .await?;
        Ok(resp.data)
    }

    pub async fn update_review(&self, review_id: i64, update: &ReviewUpdate) -> Result<Entity<Review>, Error> {
        let resp: ApiResponse<Entity<Review>> = self
            .fetch(&format!("/reviews/{review_id}"), RequestOptions::put(update)?)
            .await?;
        Ok(resp.data)
    }

    pub async fn attach_coupon(&self, review_id: i64, coupon_code: &str) -> Result<Entity<Review>, Error> {
        let update = ReviewUpdate {
            coupon_code: Some(coupon_code.to_string()),
            coupon_used: Some(false),
        };
        self.update_review(review_id, &update).await
    }

    pub async fn mark_review_coupon_used(&self, review_id: i64) -> Result<Entity<Review>, Error> {
        let update = ReviewUpdate {
            coupon_code: None,
            coupon_used: Some(true),
        };
        self.update_review(review_id, &update).await
    }

    /// Asks the backend whether `email` already reviewed this restaurant
    /// within the last 24 hours.
    pub async fn check_email_review_status(
        &self,
        restaurant_id: i64,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<ReviewStatus, Error> {
        let since = now - Duration::hours(REVIEW_COOLDOWN_HOURS);
        let query = StrapiQuery::new()
            .eq("restaurant.id", restaurant_id)
            .eq("email", email.trim().to_lowercase())
            .time_range("createdAt", Some(since), None)
            .sort("createdAt:desc")
            .page(1, 1);
        let resp: ApiResponse<Vec<Entity<Review>>> = self
            .fetch("/reviews", RequestOptions::get().query(query).anonymous())
            .await?;
        let last = resp.data.first().map(|r| r.attributes.created_at);
        Ok(ReviewStatus {
            has_reviewed_recently: last.is_some(),
            last_review_at: last,
        })
    }
}
