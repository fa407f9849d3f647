//! Provider error types.

use thiserror::Error;

pub type AiResult<T> = Result<T, AiError>;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Upstream returned no usable completion: {0}")]
    UpstreamEmptyResponse(String),

    #[error("Malformed model output: {0}")]
    MalformedModelOutput(String),

    #[error("Content moderation rejected prompt: {0}")]
    ContentModerationRejected(String),

    #[error("Provider rejected prompt language: {0}")]
    LanguageRejected(String),

    #[error("Image synthesis failed: {0}")]
    ImageSynthesisFailed(String),

    #[error("Translation failed: {0}")]
    TranslationFailed(String),
}

impl AiError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::UpstreamUnavailable(msg.into())
    }

    pub fn empty_response(msg: impl Into<String>) -> Self {
        Self::UpstreamEmptyResponse(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedModelOutput(msg.into())
    }

    pub fn image_failed(msg: impl Into<String>) -> Self {
        Self::ImageSynthesisFailed(msg.into())
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AiError::NotConfigured(_) => "not_configured",
            AiError::UpstreamUnavailable(_) => "upstream_unavailable",
            AiError::UpstreamEmptyResponse(_) => "upstream_empty_response",
            AiError::MalformedModelOutput(_) => "malformed_model_output",
            AiError::ContentModerationRejected(_) => "content_moderation",
            AiError::LanguageRejected(_) => "language_rejected",
            AiError::ImageSynthesisFailed(_) => "image_synthesis_failed",
            AiError::TranslationFailed(_) => "translation_failed",
        }
    }
}
