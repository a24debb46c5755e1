// File: feedback-core/src/feedback/wizard.rs
//
// The public feedback flow:
//
//   Rating ──(1..=4)──> Improvement ──> Comment ──> Thanks
//     │                     ▲  │           │
//     │                     └──┴── back ───┘
//     └──(5)──────────────────────────────────────> Thanks (Google Maps redirect)
//
// Pure state: no I/O happens here. `FeedbackService` performs the single
// review-creation call once the wizard reaches `Thanks`.

use std::fmt;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use feedback_common::models::{ImprovementCategory, NewReview};

use crate::Error;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
});

pub const MAX_COMMENT_LEN: usize = 1000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackStep {
    Rating,
    Improvement,
    Comment,
    Thanks,
}

impl fmt::Display for FeedbackStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackStep::Rating => write!(f, "rating"),
            FeedbackStep::Improvement => write!(f, "improvement"),
            FeedbackStep::Comment => write!(f, "comment"),
            FeedbackStep::Thanks => write!(f, "thanks"),
        }
    }
}

/// How the flow ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackOutcome {
    /// Send the visitor to the restaurant's Google Maps page.
    RedirectToGoogle { url: Option<String> },
    /// Show the in-app thank-you screen.
    ThankYou,
}

/// What the visitor has entered so far. Persisted between page loads.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeedbackDraft {
    pub rating: Option<u8>,
    pub improvement: Option<ImprovementCategory>,
    pub comment: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FeedbackWizard {
    restaurant_id: i64,
    employee_id: Option<i64>,
    google_maps_link: Option<String>,
    step: FeedbackStep,
    draft: FeedbackDraft,
    visited: Vec<FeedbackStep>,
    outcome: Option<FeedbackOutcome>,
    submitted: bool,
}

impl FeedbackWizard {
    pub fn new(restaurant_id: i64, google_maps_link: Option<String>) -> Self {
        Self {
            restaurant_id,
            employee_id: None,
            google_maps_link,
            step: FeedbackStep::Rating,
            draft: FeedbackDraft::default(),
            visited: vec![FeedbackStep::Rating],
            outcome: None,
            submitted: false,
        }
    }

    /// Attributes the feedback to the employee whose QR code was scanned.
    pub fn with_employee(mut self, employee_id: Option<i64>) -> Self {
        self.employee_id = employee_id;
        self
    }

    /// Rebuilds a wizard from a saved draft, landing on the first step
    /// that is still missing input.
    pub fn resume(restaurant_id: i64, google_maps_link: Option<String>, draft: FeedbackDraft) -> Self {
        let mut wizard = Self::new(restaurant_id, google_maps_link);
        if let Some(rating) = draft.rating.filter(|r| (1..=4).contains(r)) {
            wizard.draft.rating = Some(rating);
            wizard.goto(FeedbackStep::Improvement);
            if let Some(improvement) = draft.improvement {
                wizard.draft.improvement = Some(improvement);
                wizard.goto(FeedbackStep::Comment);
                wizard.draft.comment = draft.comment;
                wizard.draft.email = draft.email;
            }
        }
        wizard
    }

    pub fn step(&self) -> FeedbackStep {
        self.step
    }

    pub fn draft(&self) -> &FeedbackDraft {
        &self.draft
    }

    pub fn restaurant_id(&self) -> i64 {
        self.restaurant_id
    }

    /// Every step entered so far, in order (including revisits).
    pub fn visited(&self) -> &[FeedbackStep] {
        &self.visited
    }

    pub fn outcome(&self) -> Option<&FeedbackOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.step == FeedbackStep::Thanks
    }

    pub fn select_rating(&mut self, rating: u8) -> Result<FeedbackStep, Error> {
        self.expect_step(FeedbackStep::Rating, "select a rating")?;
        if !(1..=5).contains(&rating) {
            return Err(Error::Validation(format!("Rating must be between 1 and 5, got {rating}")));
        }
        self.draft.rating = Some(rating);

        if rating == 5 {
            self.outcome = Some(FeedbackOutcome::RedirectToGoogle {
                url: self.google_maps_link.clone(),
            });
            self.goto(FeedbackStep::Thanks);
        } else {
            self.goto(FeedbackStep::Improvement);
        }
        Ok(self.step)
    }

    pub fn select_improvement(&mut self, category: ImprovementCategory) -> Result<FeedbackStep, Error> {
        self.expect_step(FeedbackStep::Improvement, "pick what to improve")?;
        self.draft.improvement = Some(category);
        self.goto(FeedbackStep::Comment);
        Ok(self.step)
    }

    /// Validates and records the comment step without leaving it.
    pub fn fill_comment(&mut self, comment: &str, email: &str) -> Result<(), Error> {
        self.expect_step(FeedbackStep::Comment, "leave a comment")?;
        let comment = comment.trim();
        let email = email.trim().to_lowercase();
        if comment.is_empty() {
            return Err(Error::Validation("Please tell us what we could do better.".into()));
        }
        if comment.chars().count() > MAX_COMMENT_LEN {
            return Err(Error::Validation(format!(
                "Comments are limited to {MAX_COMMENT_LEN} characters."
            )));
        }
        if !EMAIL_RE.is_match(&email) {
            return Err(Error::Validation("Please enter a valid email address.".into()));
        }
        self.draft.comment = Some(comment.to_string());
        self.draft.email = Some(email);
        Ok(())
    }

    /// Comment step → Thanks. Requires a prior successful [`Self::fill_comment`].
    pub fn complete(&mut self) -> Result<FeedbackStep, Error> {
        self.expect_step(FeedbackStep::Comment, "finish")?;
        if self.draft.comment.is_none() || self.draft.email.is_none() {
            return Err(Error::Validation("Comment and email are required.".into()));
        }
        self.outcome = Some(FeedbackOutcome::ThankYou);
        self.goto(FeedbackStep::Thanks);
        Ok(self.step)
    }

    pub fn submit_comment(&mut self, comment: &str, email: &str) -> Result<FeedbackStep, Error> {
        self.fill_comment(comment, email)?;
        self.complete()
    }

    /// One step back. Clears what was captured in the step being left and
    /// in the step being returned to.
    pub fn back(&mut self) -> Result<FeedbackStep, Error> {
        match self.step {
            FeedbackStep::Improvement => {
                self.draft.improvement = None;
                self.draft.rating = None;
                self.goto(FeedbackStep::Rating);
            }
            FeedbackStep::Comment => {
                self.draft.comment = None;
                self.draft.email = None;
                self.draft.improvement = None;
                self.goto(FeedbackStep::Improvement);
            }
            other => {
                return Err(Error::InvalidTransition(format!("cannot go back from {other}")));
            }
        }
        Ok(self.step)
    }

    /// The review to create, handed out once per finished wizard.
    pub fn take_submission(&mut self) -> Option<NewReview> {
        if !self.is_finished() || self.submitted {
            return None;
        }
        let rating = self.draft.rating?;
        self.submitted = true;
        Some(NewReview {
            restaurant: self.restaurant_id,
            employee: self.employee_id,
            rating,
            improvement: self.draft.improvement,
            comment: self.draft.comment.clone(),
            email: self.draft.email.clone(),
            google_redirect: rating == 5,
        })
    }

    /// Allows another `take_submission` after the create call failed.
    pub fn rearm_submission(&mut self) {
        self.submitted = false;
    }

    fn expect_step(&self, expected: FeedbackStep, action: &str) -> Result<(), Error> {
        if self.step == expected {
            Ok(())
        } else {
            Err(Error::InvalidTransition(format!(
                "cannot {action} while on the {} step",
                self.step
            )))
        }
    }

    fn goto(&mut self, step: FeedbackStep) {
        self.step = step;
        self.visited.push(step);
    }
}
