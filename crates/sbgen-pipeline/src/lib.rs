//! Storyboard generation pipeline.
//!
//! Drives a creative brief through text generation, optional visual
//! enhancement, per-frame image synthesis and aggregation, reporting each
//! step to an [`EventSink`] and handing the resulting lead to a [`LeadSink`].

pub mod config;
pub mod error;
pub mod fallback;
pub mod leads;
pub mod logging;
pub mod orchestrator;
pub mod sink;
pub mod summary;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use leads::{JsonlLeadSink, LeadSink, LogLeadSink, WebhookLeadSink};
pub use logging::RunLogger;
pub use orchestrator::{FrameSource, RunStage, StoryboardOrchestrator, TOTAL_STEPS};
pub use sink::{ChannelSink, EventSink, RecordingSink};
