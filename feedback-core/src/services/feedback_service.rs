// File: feedback-core/src/services/feedback_service.rs
//
// Drives one visitor through the feedback wizard and turns the finished
// wizard into exactly one review-creation call, plus the side effects of
// negative feedback (coupon for the customer, alert for the owner).

use std::sync::Arc;
use tracing::{error, info, warn};

use feedback_common::models::{
    Coupon, EmailMessage, Entity, ImprovementCategory, Restaurant, Review,
    review::is_negative_rating,
};
use feedback_common::traits::EmailSender;

use crate::api::SecureApiClient;
use crate::email::{EMAIL_SEND_TIMEOUT, send_bounded};
use crate::feedback::{FeedbackDraft, FeedbackOutcome, FeedbackStep, FeedbackWizard};
use crate::services::coupon_service::CouponService;
use crate::services::metrics_service::MetricsService;
use crate::storage::{LocalStore, draft_key};
use crate::utils::time::Clock;
use crate::Error;

/// One visitor's pass through the flow for one restaurant.
pub struct FeedbackSession {
    pub restaurant: Entity<Restaurant>,
    pub wizard: FeedbackWizard,
}

impl FeedbackSession {
    pub fn step(&self) -> FeedbackStep {
        self.wizard.step()
    }
}

/// Result of the single create call.
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub review: Entity<Review>,
    pub coupon: Option<Entity<Coupon>>,
    pub outcome: FeedbackOutcome,
}

#[derive(Debug, Clone)]
pub enum FeedbackProgress {
    Step(FeedbackStep),
    Finished(SubmissionReceipt),
}

pub struct FeedbackService {
    api: Arc<SecureApiClient>,
    coupons: Arc<CouponService>,
    metrics: Arc<MetricsService>,
    email: Arc<dyn EmailSender>,
    store: Arc<LocalStore>,
    clock: Arc<dyn Clock>,
    alert_template_id: Option<String>,
}

impl FeedbackService {
    pub fn new(
        api: Arc<SecureApiClient>,
        coupons: Arc<CouponService>,
        metrics: Arc<MetricsService>,
        email: Arc<dyn EmailSender>,
        store: Arc<LocalStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            api,
            coupons,
            metrics,
            email,
            store,
            clock,
            alert_template_id: None,
        }
    }

    pub fn with_alert_template(mut self, template_id: Option<String>) -> Self {
        self.alert_template_id = template_id;
        self
    }

    /// Looks the restaurant up by slug, counts the visit as a tap and
    /// restores any draft left from an earlier page load.
    pub async fn start_session(&self, slug: &str, employee_id: Option<i64>) -> Result<FeedbackSession, Error> {
        let restaurant = self
            .api
            .find_restaurant_by_slug(slug)
            .await?
            .ok_or_else(|| Error::NotFound(format!("restaurant '{slug}'")))?;

        if let Err(e) = self.api.record_tap(restaurant.id).await {
            warn!("Could not record tap for restaurant={}: {}", restaurant.id, e);
        }

        let link = restaurant.attributes.google_maps_link.clone();
        let wizard = match self.store.get::<FeedbackDraft>(&draft_key(slug)) {
            Some(draft) => {
                info!("Resuming feedback draft for restaurant={}", restaurant.id);
                FeedbackWizard::resume(restaurant.id, link, draft)
            }
            None => FeedbackWizard::new(restaurant.id, link),
        }
        .with_employee(employee_id);

        Ok(FeedbackSession { restaurant, wizard })
    }

    pub async fn select_rating(&self, session: &mut FeedbackSession, rating: u8) -> Result<FeedbackProgress, Error> {
        let step = session.wizard.select_rating(rating)?;
        self.after_step(session, step).await
    }

    pub async fn select_improvement(
        &self,
        session: &mut FeedbackSession,
        category: ImprovementCategory,
    ) -> Result<FeedbackProgress, Error> {
        let step = session.wizard.select_improvement(category)?;
        self.after_step(session, step).await
    }

    /// Validates the comment, asks the backend whether this email already
    /// reviewed the restaurant in the last 24 hours, then submits.
    pub async fn submit_comment(
        &self,
        session: &mut FeedbackSession,
        comment: &str,
        email: &str,
    ) -> Result<FeedbackProgress, Error> {
        session.wizard.fill_comment(comment, email)?;
        self.save_draft(session);

        let email = session.wizard.draft().email.clone().unwrap_or_default();
        let status = self
            .api
            .check_email_review_status(session.restaurant.id, &email, self.clock.now())
            .await?;
        if status.has_reviewed_recently {
            return Err(Error::DuplicateSubmission(format!(
                "{} already reviewed restaurant {}",
                email, session.restaurant.id
            )));
        }

        let step = session.wizard.complete()?;
        self.after_step(session, step).await
    }

    pub fn back(&self, session: &mut FeedbackSession) -> Result<FeedbackStep, Error> {
        let step = session.wizard.back()?;
        self.save_draft(session);
        Ok(step)
    }

    /// Creates the review for a finished wizard. Can be called again after a
    /// failed attempt; a successful submission is never repeated.
    pub async fn submit(&self, session: &mut FeedbackSession) -> Result<SubmissionReceipt, Error> {
        let Some(new_review) = session.wizard.take_submission() else {
            return Err(Error::DuplicateSubmission(
                "this feedback was already submitted or is not finished".into(),
            ));
        };

        let review = match self.api.create_review(&new_review).await {
            Ok(review) => review,
            Err(e) => {
                error!("Creating review for restaurant={} failed: {}", session.restaurant.id, e);
                session.wizard.rearm_submission();
                return Err(e);
            }
        };
        info!(
            "Review {} created for restaurant={} rating={}",
            review.id, session.restaurant.id, review.attributes.rating
        );

        if let Err(e) = self.store.remove(&draft_key(&session.restaurant.attributes.slug)) {
            warn!("Could not clear feedback draft: {}", e);
        }
        self.metrics.invalidate(session.restaurant.id);

        let mut coupon = None;
        if is_negative_rating(review.attributes.rating) {
            if let Some(email) = new_review.email.as_deref() {
                match self.coupons.issue_coupon(&session.restaurant, review.id, email).await {
                    Ok(c) => coupon = Some(c),
                    Err(e) => error!("Coupon for review={} could not be issued: {}", review.id, e),
                }
            }
            self.alert_owner(&session.restaurant, &review.attributes).await;
        }

        let outcome = session
            .wizard
            .outcome()
            .cloned()
            .unwrap_or(FeedbackOutcome::ThankYou);
        Ok(SubmissionReceipt { review, coupon, outcome })
    }

    async fn after_step(&self, session: &mut FeedbackSession, step: FeedbackStep) -> Result<FeedbackProgress, Error> {
        if step == FeedbackStep::Thanks {
            let receipt = self.submit(session).await?;
            return Ok(FeedbackProgress::Finished(receipt));
        }
        self.save_draft(session);
        Ok(FeedbackProgress::Step(step))
    }

    fn save_draft(&self, session: &FeedbackSession) {
        let key = draft_key(&session.restaurant.attributes.slug);
        if let Err(e) = self.store.set(&key, session.wizard.draft()) {
            warn!("Could not save feedback draft: {}", e);
        }
    }

    async fn alert_owner(&self, restaurant: &Entity<Restaurant>, review: &Review) {
        let (Some(template_id), Some(owner_email)) =
            (&self.alert_template_id, restaurant.attributes.owner_email.as_deref())
        else {
            return;
        };
        let improvement = review.improvement.map(|c| c.to_string());
        let message = EmailMessage::negative_review_alert(
            template_id,
            owner_email,
            &restaurant.attributes.name,
            review.rating,
            improvement.as_deref(),
            review.comment.as_deref(),
            review.email.as_deref(),
        );
        if let Err(e) = send_bounded(self.email.as_ref(), &message, EMAIL_SEND_TIMEOUT).await {
            error!("Negative review alert for restaurant={} failed: {}", restaurant.id, e);
        }
    }
}
