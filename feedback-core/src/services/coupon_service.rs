// File: feedback-core/src/services/coupon_service.rs

use std::sync::Arc;
use chrono::Duration;
use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::{error, info, warn};

use feedback_common::models::{Coupon, EmailMessage, Entity, NewCoupon, Restaurant};
use feedback_common::traits::EmailSender;

use crate::api::SecureApiClient;
use crate::email::{EMAIL_SEND_TIMEOUT, send_bounded};
use crate::utils::time::Clock;
use crate::Error;

#[derive(Debug, Clone)]
pub struct CouponConfig {
    pub discount_percentage: u8,
    pub validity: Duration,
    pub code_length: usize,
    pub email_template_id: Option<String>,
}

impl Default for CouponConfig {
    fn default() -> Self {
        Self {
            discount_percentage: 10,
            validity: Duration::days(30),
            code_length: 8,
            email_template_id: None,
        }
    }
}

/// Random upper-case alphanumeric code.
pub fn generate_coupon_code<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_uppercase())
        .collect()
}

pub struct CouponService {
    api: Arc<SecureApiClient>,
    email: Arc<dyn EmailSender>,
    clock: Arc<dyn Clock>,
    config: CouponConfig,
}

impl CouponService {
    pub fn new(
        api: Arc<SecureApiClient>,
        email: Arc<dyn EmailSender>,
        clock: Arc<dyn Clock>,
        config: CouponConfig,
    ) -> Self {
        Self {
            api,
            email,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &CouponConfig {
        &self.config
    }

    /// Creates a coupon for `review_id`, links it to the review and mails it
    /// to the customer. A failed email is logged; the coupon still stands.
    pub async fn issue_coupon(
        &self,
        restaurant: &Entity<Restaurant>,
        review_id: i64,
        email: &str,
    ) -> Result<Entity<Coupon>, Error> {
        let code = generate_coupon_code(&mut rand::rng(), self.config.code_length);
        let expires_at = self.clock.now() + self.config.validity;
        let new_coupon = NewCoupon {
            code: code.clone(),
            discount_percentage: self.config.discount_percentage,
            restaurant: restaurant.id,
            review: Some(review_id),
            email: Some(email.to_string()),
            used: false,
            expires_at,
        };

        let coupon = self.api.create_coupon(&new_coupon).await?;
        self.api.attach_coupon(review_id, &code).await?;
        info!("Issued coupon {} for review={} restaurant={}", code, review_id, restaurant.id);

        match &self.config.email_template_id {
            Some(template_id) => {
                let message = EmailMessage::coupon(
                    template_id,
                    email,
                    &restaurant.attributes.name,
                    &code,
                    self.config.discount_percentage,
                    expires_at,
                );
                if let Err(e) = send_bounded(self.email.as_ref(), &message, EMAIL_SEND_TIMEOUT).await {
                    error!("Coupon {} created but the email to {} failed: {}", code, email, e);
                }
            }
            None => warn!("No coupon email template configured; coupon {} not mailed", code),
        }
        Ok(coupon)
    }

    /// Marks a coupon (and the review it came from) as used.
    pub async fn redeem(&self, code: &str) -> Result<Entity<Coupon>, Error> {
        let coupon = self
            .api
            .find_coupon(code)
            .await?
            .ok_or_else(|| Error::NotFound(format!("coupon {}", code.trim().to_uppercase())))?;

        if coupon.attributes.used {
            return Err(Error::Validation("This coupon has already been used.".into()));
        }
        if coupon.attributes.is_expired(self.clock.now()) {
            return Err(Error::Validation("This coupon has expired.".into()));
        }

        let updated = self.api.mark_coupon_used(coupon.id).await?;
        if let Some(review_id) = coupon.attributes.review.as_ref().and_then(|r| r.id()) {
            self.api.mark_review_coupon_used(review_id).await?;
        }
        info!("Redeemed coupon {}", coupon.attributes.code);
        Ok(updated)
    }
}
