//! REST ⟶ /restaurants

use feedback_common::models::{ApiResponse, Entity, Restaurant, RestaurantUpdate};
use tracing::info;

use crate::api::client::{RequestOptions, SecureApiClient};
use crate::api::query::StrapiQuery;
use crate::Error;

impl SecureApiClient {
    pub async fn get_restaurant(&self, restaurant_id: i64) -> Result<Entity<Restaurant>, Error> {
        let resp: ApiResponse<Entity<Restaurant>> = self
            .fetch(&format!("/restaurants/{restaurant_id}"), RequestOptions::get())
            .await?;
        Ok(resp.data)
    }

    /// Public lookup used by the feedback page (`/r/<slug>`).
    pub async fn find_restaurant_by_slug(&self, slug: &str) -> Result<Option<Entity<Restaurant>>, Error> {
        let query = StrapiQuery::new().eq("slug", slug).page(1, 1);
        let resp: ApiResponse<Vec<Entity<Restaurant>>> = self
            .fetch("/restaurants", RequestOptions::get().query(query).anonymous())
            .await?;
        Ok(resp.data.into_iter().next())
    }

    pub async fn list_owner_restaurants(&self, owner_uid: &str) -> Result<Vec<Entity<Restaurant>>, Error> {
        let query = StrapiQuery::new()
            .eq("owner", owner_uid)
            .sort("name:asc")
            .page(1, super::MAX_PAGE_SIZE);
        let resp: ApiResponse<Vec<Entity<Restaurant>>> =
            self.fetch("/restaurants", RequestOptions::get().query(query)).await?;
        Ok(resp.data)
    }

    pub async fn update_restaurant(
        &self,
        restaurant_id: i64,
        update: &RestaurantUpdate,
    ) -> Result<Entity<Restaurant>, Error> {
        let resp: ApiResponse<Entity<Restaurant>> = self
            .fetch(&format!("/restaurants/{restaurant_id}"), RequestOptions::put(update)?)
            .await?;
        Ok(resp.data)
    }

    /// Bumps the engagement counter by one (read, then write back).
    pub async fn record_tap(&self, restaurant_id: i64) -> Result<Entity<Restaurant>, Error> {
        let current = self.get_restaurant(restaurant_id).await?;
        let update = RestaurantUpdate {
            taps: Some(current.attributes.taps + 1),
            ..Default::default()
        };
        let updated = self.update_restaurant(restaurant_id, &update).await?;
        info!("Recorded tap for restaurant={} (taps={})", restaurant_id, updated.attributes.taps);
        Ok(updated)
    }
}
