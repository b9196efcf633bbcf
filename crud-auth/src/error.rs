//! Error types for authentication strategies

use serde_json::{json, Value};
use thiserror::Error;

/// Authentication error types.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Token has expired
    #[error("Token has expired")]
    TokenExpired,

    /// Token is invalid (malformed, bad signature, wrong issuer, etc.)
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The strategy keeps no sessions to end
    #[error("Logout is not supported for {0} auth")]
    LogoutUnsupported(&'static str),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// Check if this error should be logged at error level.
    ///
    /// Rejected tokens are expected and are not server errors.
    pub fn is_server_error(&self) -> bool {
        matches!(self, AuthError::Internal(_) | AuthError::ConfigError(_))
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::TokenExpired | AuthError::InvalidToken(_) => 401,
            AuthError::LogoutUnsupported(_) => 403,
            AuthError::ConfigError(_) | AuthError::Internal(_) => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::InvalidToken(_) => "INVALID_TOKEN",
            AuthError::LogoutUnsupported(_) => "LOGOUT_UNSUPPORTED",
            AuthError::ConfigError(_) => "CONFIG_ERROR",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Response body for API translation. Token details never reach the client.
    pub fn body(&self) -> Value {
        match self {
            AuthError::TokenExpired | AuthError::InvalidToken(_) => {
                json!({"message": "Session invalid or expires"})
            }
            AuthError::LogoutUnsupported(_) => json!({"message": "Logout failed"}),
            AuthError::ConfigError(_) | AuthError::Internal(_) => {
                json!({"message": "Internal server error!"})
            }
        }
    }
}
