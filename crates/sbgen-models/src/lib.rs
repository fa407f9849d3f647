//! Shared data models for the storyboard generation service.
//!
//! This crate provides Serde-serializable types for:
//! - Creative briefs and their validation
//! - Storyboard frames and the aggregated storyboard
//! - Progress events streamed to clients
//! - Lead records captured after a run
//! - Budget estimation

pub mod brief;
pub mod budget;
pub mod error;
pub mod language;
pub mod lead;
pub mod progress;
pub mod run;
pub mod storyboard;

// Re-export common types
pub use brief::{BriefPayload, BudgetTier, ContactInfo, CreativeBrief, ProjectType, TargetAudience, MAX_FIELD_CHARS};
pub use budget::{BudgetEstimate, BudgetEstimator, BUDGET_CURRENCY};
pub use error::{ModelError, ModelResult};
pub use language::OutputLanguage;
pub use lead::LeadRecord;
pub use progress::{ProgressEvent, ProgressEventType};
pub use run::RunId;
pub use storyboard::{GeneratedStoryboard, StoryboardFrame, DEFAULT_FRAME_SECONDS};
