// ================================================================
// File: feedback-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found error: {0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Non-2xx answer from the REST backend.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A newer request to the same endpoint superseded this one.
    #[error("Request aborted: {0}")]
    Aborted(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Rate limit exceeded for client: {0}")]
    RateLimited(String),

    /// The response body did not match the expected shape.
    #[error("Schema validation error: {0}")]
    Schema(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid feedback transition: {0}")]
    InvalidTransition(String),

    #[error("Feedback already submitted: {0}")]
    DuplicateSubmission(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Email error: {0}")]
    Email(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    /// HTTP-like status for every error kind. Transport failures
    /// (network, abort, timeout) all read as 500.
    pub fn status(&self) -> u16 {
        match self {
            Error::Api { status, .. } => *status,
            Error::NotFound(_) => 404,
            Error::RateLimited(_) => 429,
            Error::Validation(_) | Error::InvalidTransition(_) => 400,
            Error::DuplicateSubmission(_) => 409,
            Error::Auth(_) => 401,
            Error::Http(e) => e.status().map(|s| s.as_u16()).unwrap_or(500),
            _ => 500,
        }
    }

    /// True for failures where the request never produced an answer.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Aborted(_) | Error::Timeout(_))
            || matches!(self, Error::Http(e) if e.status().is_none())
    }

    /// Message safe to show to an end user (toast / inline form error).
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(msg) => msg.clone(),
            Error::DuplicateSubmission(_) => {
                "You have already left feedback for this restaurant today. Thank you!".to_string()
            }
            Error::RateLimited(_) => "Too many requests. Please wait a moment and try again.".to_string(),
            Error::Auth(_) => "Your session has expired. Please sign in again.".to_string(),
            Error::NotFound(_) => "We could not find what you were looking for.".to_string(),
            Error::Api { status, .. } if *status == 401 || *status == 403 => {
                "You are not allowed to perform this action.".to_string()
            }
            Error::Api { status, .. } if *status == 404 => {
                "We could not find what you were looking for.".to_string()
            }
            Error::Api { status, .. } if *status >= 500 => {
                "The server is having trouble right now. Please try again later.".to_string()
            }
            e if e.is_connection_error() => {
                "Connection error. Please check your internet connection and try again.".to_string()
            }
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Parse(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Parse(s.to_string())
    }
}

impl From<chrono::format::ParseError> for Error {
    fn from(err: chrono::format::ParseError) -> Self {
        Error::Parse(err.to_string())
    }
}
