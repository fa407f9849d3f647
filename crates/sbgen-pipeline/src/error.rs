//! Pipeline error types.

use thiserror::Error;

use sbgen_models::ModelError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(#[from] ModelError),

    #[error("Unexpected orchestrator failure: {0}")]
    Internal(String),

    #[error("Lead persistence failed: {0}")]
    LeadPersistence(String),
}

impl PipelineError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn lead_persistence(msg: impl Into<String>) -> Self {
        Self::LeadPersistence(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, PipelineError::Validation(_))
    }
}
