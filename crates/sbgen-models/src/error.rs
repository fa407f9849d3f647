//! Model validation errors.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Missing required fields: {}", fields.join(", "))]
    ValidationFailed { fields: Vec<String> },

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: String, reason: String },
}

impl ModelError {
    pub fn missing(fields: Vec<String>) -> Self {
        Self::ValidationFailed { fields }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
