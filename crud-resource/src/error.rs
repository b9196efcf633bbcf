//! Error types for resource operations

use crud_acl::Action;
use crud_schema::{RecordId, SchemaError};
use serde_json::{json, Value};
use thiserror::Error;

/// Errors raised by a database model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The model does not implement the action
    #[error("Model does not support {0}")]
    Unsupported(Action),

    /// No record with this id
    #[error("Record not found: {0}")]
    NotFound(RecordId),

    /// Storage backend failure
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

impl ModelError {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ModelError::Unsupported(_) | ModelError::NotFound(_) => 404,
            ModelError::Backend(_) => 500,
        }
    }
}

/// Resource error types.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Validation, field policy or hook failure from the schema
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// No model, or the model lacks the capability
    #[error("{0}")]
    NotFound(String),

    /// Resource-level gate failed
    #[error("Permission denied {token}")]
    Permission {
        /// The token that was checked
        token: String,
    },

    /// Database model failure
    #[error(transparent)]
    Model(#[from] ModelError),

    /// List query could not be parsed
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

/// Result type for resource operations.
pub type ResourceResult<T> = Result<T, ResourceError>;

impl ResourceError {
    /// The model lacks `action`.
    pub fn model_not_defined(resource_name: &str, action: Action) -> Self {
        ResourceError::NotFound(format!("Model not defined {}.{}", resource_name, action))
    }

    /// No model is bound for the resource.
    pub fn no_database(resource_name: &str) -> Self {
        ResourceError::NotFound(format!("No database defined for resource {}", resource_name))
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ResourceError::Schema(e) => e.status_code(),
            ResourceError::NotFound(_) => 404,
            ResourceError::Permission { .. } => 403,
            ResourceError::Model(e) => e.status_code(),
            ResourceError::InvalidQuery(_) => 400,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            ResourceError::Schema(e) => e.error_code(),
            ResourceError::NotFound(_) => "NOT_FOUND",
            ResourceError::Permission { .. } => "PERMISSION_DENIED",
            ResourceError::Model(ModelError::Backend(_)) => "INTERNAL_ERROR",
            ResourceError::Model(_) => "NOT_FOUND",
            ResourceError::InvalidQuery(_) => "INVALID_QUERY",
        }
    }

    /// Response body for API translation.
    ///
    /// Internal details (model names, backend messages) are not echoed.
    pub fn body(&self) -> Value {
        match self {
            ResourceError::Schema(e) => e.body(),
            ResourceError::NotFound(_) | ResourceError::Model(ModelError::NotFound(_)) => {
                json!({"message": "Not found."})
            }
            ResourceError::Model(ModelError::Unsupported(_)) => json!({"message": "Not found."}),
            ResourceError::Model(ModelError::Backend(_)) => {
                json!({"message": "Internal server error!"})
            }
            ResourceError::Permission { .. } => json!({"message": "Permission denied"}),
            ResourceError::InvalidQuery(_) => json!({"message": self.to_string()}),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_not_defined() {
        let err = ResourceError::model_not_defined("post", Action::Create);
        assert_eq!(err.to_string(), "Model not defined post.create");
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.body(), json!({"message": "Not found."}));
    }

    #[test]
    fn test_schema_errors_pass_through() {
        let err: ResourceError = SchemaError::UnknownField("x".into()).into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "UNKNOWN_FIELD");
        assert_eq!(err.to_string(), "Unknown field x");
    }

    #[test]
    fn test_backend_error_hidden() {
        let err: ResourceError = ModelError::Backend("connection refused".into()).into();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.body(), json!({"message": "Internal server error!"}));
    }
}
