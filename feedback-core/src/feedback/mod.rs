pub mod wizard;

pub use wizard::{FeedbackDraft, FeedbackOutcome, FeedbackStep, FeedbackWizard};
