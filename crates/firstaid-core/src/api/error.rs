use thiserror::Error;

use crate::messages::{Locale, Message};

/// Transport-level failure talking to the identity service.
///
/// Only ever logged. Callers of the login flow see [`AuthError`].
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }
}

/// Outcome of a failed login, as seen by the UI.
///
/// Every remote failure is `InvalidCredentials` so the UI never reveals
/// which field was wrong.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("email and password are both required")]
    Validation,

    #[error("email or password is incorrect")]
    InvalidCredentials,
}

impl AuthError {
    pub fn message(self) -> Message {
        match self {
            AuthError::Validation => Message::MissingFields,
            AuthError::InvalidCredentials => Message::InvalidCredentials,
        }
    }

    pub fn user_message(self, locale: Locale) -> &'static str {
        self.message().text(locale)
    }
}

impl From<ApiError> for AuthError {
    fn from(_: ApiError) -> Self {
        AuthError::InvalidCredentials
    }
}
