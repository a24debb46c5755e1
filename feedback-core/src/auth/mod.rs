// =============================================================================
// feedback-core/src/auth/mod.rs
// =============================================================================

pub mod firebase;
pub mod token_manager;

pub use firebase::{FirebaseAuth, FirebaseSession};
pub use token_manager::TokenManager;
pub use feedback_common::traits::IdentityProvider;
