//! Progress events streamed to the client during a run.
//!
//! Serialized as an internally tagged union on `type`:
//! `progress`, `content`, `complete`, `error`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::storyboard::GeneratedStoryboard;

/// Discriminant of a [`ProgressEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProgressEventType {
    Progress,
    Content,
    Complete,
    Error,
}

impl ProgressEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressEventType::Progress => "progress",
            ProgressEventType::Content => "content",
            ProgressEventType::Complete => "complete",
            ProgressEventType::Error => "error",
        }
    }
}

/// One event of a run. Exactly one `Complete` or `Error` ends a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressEvent {
    /// Checkpoint reached (percent is 0-100)
    Progress {
        step: u8,
        #[serde(rename = "totalSteps")]
        total_steps: u8,
        message: String,
        percent: u8,
    },

    /// Intermediate generated text
    Content { text: String },

    /// Run finished with a storyboard
    Complete {
        storyboard: GeneratedStoryboard,
        message: String,
    },

    /// Run failed
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
}

impl ProgressEvent {
    /// Create a progress event; `percent` is clamped to 100.
    pub fn progress(step: u8, total_steps: u8, message: impl Into<String>, percent: u8) -> Self {
        ProgressEvent::Progress {
            step,
            total_steps,
            message: message.into(),
            percent: percent.min(100),
        }
    }

    pub fn content(text: impl Into<String>) -> Self {
        ProgressEvent::Content { text: text.into() }
    }

    pub fn complete(storyboard: GeneratedStoryboard, message: impl Into<String>) -> Self {
        ProgressEvent::Complete {
            storyboard,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ProgressEvent::Error {
            message: message.into(),
            detail: None,
        }
    }

    pub fn error_with_detail(message: impl Into<String>, detail: impl Into<String>) -> Self {
        ProgressEvent::Error {
            message: message.into(),
            detail: Some(detail.into()),
        }
    }

    /// Get the event type.
    pub fn event_type(&self) -> ProgressEventType {
        match self {
            ProgressEvent::Progress { .. } => ProgressEventType::Progress,
            ProgressEvent::Content { .. } => ProgressEventType::Content,
            ProgressEvent::Complete { .. } => ProgressEventType::Complete,
            ProgressEvent::Error { .. } => ProgressEventType::Error,
        }
    }

    /// Whether this event ends the run.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::Complete { .. } | ProgressEvent::Error { .. }
        )
    }

    /// Percent carried by a progress event.
    pub fn percent(&self) -> Option<u8> {
        match self {
            ProgressEvent::Progress { percent, .. } => Some(*percent),
            _ => None,
        }
    }
}
