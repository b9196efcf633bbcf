//! Error types for schema operations
//!
//! This module defines the errors raised while validating input against a
//! schema, checking field policies and projecting views, plus the errors
//! raised while building a schema.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::action::SchemaAction;

/// One structural mismatch found by a validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// JSON pointer of the offending value (`""` for the whole object).
    pub path: String,
    /// Failed constraint (`type`, `required`, `additionalProperties`, ...).
    pub keyword: String,
    /// Human-readable message.
    pub message: String,
}

impl FieldError {
    /// Create a new field error.
    pub fn new(path: impl Into<String>, keyword: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            keyword: keyword.into(),
            message: message.into(),
        }
    }
}

/// Schema error types.
///
/// Every variant maps to an HTTP status via [`SchemaError::status_code`].
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Input does not match the derived action schema
    #[error("Validate failed")]
    Validation {
        /// Structured list of mismatches
        errors: Vec<FieldError>,
    },

    /// Actor lacks the resource-level permission
    #[error("Permission denied {token}")]
    Permission {
        /// The token that was checked
        token: String,
    },

    /// Field policy excludes the field from this action
    #[error("Field {field} not allowed to {action}.")]
    FieldForbidden {
        /// Field name
        field: String,
        /// Action attempted
        action: SchemaAction,
    },

    /// Actor lacks the token the field policy requires
    #[error("Permission denied to {action} \"{field}\".")]
    FieldPermission {
        /// Field name
        field: String,
        /// Action attempted
        action: SchemaAction,
    },

    /// Key is not declared in the schema
    #[error("Unknown field {0}")]
    UnknownField(String),

    /// A hook rejected the operation
    #[error("{message}")]
    Rejected {
        /// HTTP status to surface
        status: u16,
        /// Message to surface
        message: String,
    },
}

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

impl SchemaError {
    /// Convenience constructor for hooks rejecting with `400`.
    pub fn rejected(message: impl Into<String>) -> Self {
        SchemaError::Rejected {
            status: 400,
            message: message.into(),
        }
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            SchemaError::Validation { .. } | SchemaError::UnknownField(_) => 400,
            SchemaError::Permission { .. }
            | SchemaError::FieldForbidden { .. }
            | SchemaError::FieldPermission { .. } => 403,
            SchemaError::Rejected { status, .. } => *status,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            SchemaError::Validation { .. } => "VALIDATION_FAILED",
            SchemaError::Permission { .. } => "PERMISSION_DENIED",
            SchemaError::FieldForbidden { .. } => "FIELD_FORBIDDEN",
            SchemaError::FieldPermission { .. } => "FIELD_PERMISSION_DENIED",
            SchemaError::UnknownField(_) => "UNKNOWN_FIELD",
            SchemaError::Rejected { .. } => "REJECTED",
        }
    }

    /// Response body for API translation.
    ///
    /// Validation failures carry the field error list; resource-level
    /// denials do not echo the checked token.
    pub fn body(&self) -> Value {
        match self {
            SchemaError::Validation { errors } => json!({
                "message": "Invalid input",
                "errors": errors,
            }),
            SchemaError::Permission { .. } => json!({"message": "Permission denied"}),
            other => json!({"message": other.to_string()}),
        }
    }
}

/// Errors raised while building a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Resource name is empty
    #[error("Resource name must not be empty")]
    EmptyResourceName,

    /// Two fields share a name
    #[error("Duplicate field: {0}")]
    DuplicateField(String),

    /// A hook was set more than once
    #[error("Hook already set: {0}")]
    HookAlreadySet(&'static str),

    /// Scope field is not declared
    #[error("Scope field is not declared: {0}")]
    UnknownScopeField(String),

    /// A derived action schema failed to compile
    #[error("Invalid {action} schema: {message}")]
    InvalidSchema {
        /// Action whose schema was rejected
        action: &'static str,
        /// Compiler message
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(SchemaError::Validation { errors: vec![] }.status_code(), 400);
        assert_eq!(SchemaError::UnknownField("x".into()).status_code(), 400);
        assert_eq!(
            SchemaError::Permission { token: "create.x".into() }.status_code(),
            403
        );
        assert_eq!(
            SchemaError::FieldForbidden {
                field: "a".into(),
                action: SchemaAction::Update
            }
            .status_code(),
            403
        );
        assert_eq!(
            SchemaError::Rejected { status: 409, message: "taken".into() }.status_code(),
            409
        );
    }

    #[test]
    fn test_messages() {
        let err = SchemaError::FieldPermission {
            field: "restricted".into(),
            action: SchemaAction::Update,
        };
        assert_eq!(err.to_string(), "Permission denied to update \"restricted\".");

        let err = SchemaError::FieldForbidden {
            field: "id".into(),
            action: SchemaAction::Create,
        };
        assert_eq!(err.to_string(), "Field id not allowed to create.");
    }

    #[test]
    fn test_validation_body_carries_errors() {
        let err = SchemaError::Validation {
            errors: vec![FieldError::new("", "required", "must have required property 'name'")],
        };
        let body = err.body();
        assert_eq!(body["message"], "Invalid input");
        assert_eq!(body["errors"][0]["keyword"], "required");
    }

    #[test]
    fn test_permission_body_hides_token() {
        let body = SchemaError::Permission { token: "view.secret".into() }.body();
        assert_eq!(body, json!({"message": "Permission denied"}));
    }
}
