//! Error types for API calls and flows
//!
//! A non-2xx response is never an error by itself. It becomes one only when a
//! caller asserts on it via [`crate::ApiResponse::expect_status`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("{step}: expected status {expected}, got {actual} ({body})")]
    UnexpectedStatus {
        step: String,
        expected: u16,
        actual: u16,
        body: String,
    },

    #[error("Login succeeded but the response carried no authorization token")]
    MissingAuthorization,

    #[error("Authenticated request needs credentials, none were configured")]
    MissingCredentials,

    #[error("No user with email {email}")]
    UserNotFound { email: String },

    #[error("Assertion failed: {0}")]
    Assertion(String),
}

impl ClientError {
    /// True when the error only says the user is absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::UserNotFound { .. })
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
