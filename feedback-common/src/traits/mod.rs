pub mod validate;
pub mod identity_traits;
pub mod email_traits;

pub use validate::Validate;
pub use identity_traits::IdentityProvider;
pub use email_traits::EmailSender;
