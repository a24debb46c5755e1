//! REST ⟶ /coupons

use chrono::{DateTime, Utc};
use feedback_common::models::{ApiResponse, Coupon, CouponUpdate, Entity, MetricsFilter, NewCoupon};

use crate::api::client::{RequestOptions, SecureApiClient};
use crate::api::query::StrapiQuery;
use crate::Error;

impl SecureApiClient {
    pub async fn create_coupon(&self, coupon: &NewCoupon) -> Result<Entity<Coupon>, Error> {
        let resp: ApiResponse<Entity<Coupon>> = self
            .fetch("/coupons", RequestOptions::post(coupon)?.anonymous())
            .await?;
        Ok(resp.data)
    }

    /// Codes are stored upper-case; lookup is case-insensitive on input.
    pub async fn find_coupon(&self, code: &str) -> Result<Option<Entity<Coupon>>, Error> {
        let query = StrapiQuery::new()
            .eq("code", code.trim().to_uppercase())
            .page(1, 1)
            .populate("review");
        let resp: ApiResponse<Vec<Entity<Coupon>>> =
            self.fetch("/coupons", RequestOptions::get().query(query)).await?;
        Ok(resp.data.into_iter().next())
    }

    pub async fn mark_coupon_used(&self, coupon_id: i64) -> Result<Entity<Coupon>, Error> {
        let update = CouponUpdate {
            used: Some(true),
            ..Default::default()
        };
        let resp: ApiResponse<Entity<Coupon>> = self
            .fetch(&format!("/coupons/{coupon_id}"), RequestOptions::put(&update)?)
            .await?;
        Ok(resp.data)
    }

    pub async fn list_coupons(
        &self,
        restaurant_id: i64,
        filter: &MetricsFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<Entity<Coupon>>, Error> {
        let (from, to) = filter.range(now);
        let query = StrapiQuery::new()
            .eq("restaurant.id", restaurant_id)
            .time_range("createdAt", from, to)
            .sort("createdAt:desc")
            .page(1, super::MAX_PAGE_SIZE);
        let resp: ApiResponse<Vec<Entity<Coupon>>> =
            self.fetch("/coupons", RequestOptions::get().query(query)).await?;
        Ok(resp.data)
    }
}
