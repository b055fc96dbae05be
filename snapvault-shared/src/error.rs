/// Errors of the session and password-reset token lifecycle
///
/// Every variant carries the message that may be shown to an end user,
/// decided where the error is raised. Lookup failures ("no such token",
/// "expired token") deliberately share one message so responses cannot be
/// used to discover which tokens or accounts exist.
use chrono::{DateTime, Utc};

/// Message shown for any unknown, tampered or expired credential
pub const INVALID_OR_EXPIRED: &str = "The link or session is invalid or has expired.";

/// Message shown for internal failures
pub const SOMETHING_WENT_WRONG: &str = "Something went wrong. Please try again.";

/// Result alias for token lifecycle operations
pub type TokenResult<T> = Result<T, TokenError>;

/// Error type for session and password-reset operations
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The secure random source failed to supply the requested bytes
    #[error("Insufficient entropy: {0}")]
    InsufficientEntropy(#[source] rand::Error),

    /// Any persistence failure
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// No matching session, reset request or user
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Reset token presented after its deadline
    #[error("Password reset expired at {0}")]
    Expired(DateTime<Utc>),
}

impl TokenError {
    /// Message that is safe to show to the requester
    pub fn user_message(&self) -> &'static str {
        match self {
            TokenError::NotFound(_) | TokenError::Expired(_) => INVALID_OR_EXPIRED,
            TokenError::InsufficientEntropy(_) | TokenError::Storage(_) => SOMETHING_WENT_WRONG,
        }
    }

    /// Whether the error is an expected outcome rather than a failure
    pub fn is_rejection(&self) -> bool {
        matches!(self, TokenError::NotFound(_) | TokenError::Expired(_))
    }
}
