//! Provider clients and model-output handling for storyboard generation.
//!
//! This crate provides:
//! - Prompt templates for commercial and influencer storyboards
//! - Extraction of scene frames from unreliable model output
//! - A chat-completion text client behind the `TextGenerator` trait
//! - Best-effort translation on top of any `TextGenerator`
//! - An image-generation client behind the `ImageGenerator` trait, wrapped by
//!   `ImageSynthesizer` for translation, truncation and placeholder handling

pub mod config;
pub mod error;
pub mod extract;
pub mod image;
pub mod language;
pub mod prompt;
pub mod text;
pub mod translate;

pub use config::{ImageProviderConfig, TextProviderConfig};
pub use error::{AiError, AiResult};
pub use extract::{extract_frames, ExtractionStrategy};
pub use image::{
    classify_image_error, truncate_prompt, HttpImageClient, ImageGenerator, ImageKind, ImagePayload,
    ImageReference, ImageRequest, ImageSettings, ImageSize, ImageSynthesizer, PlaceholderReason,
};
pub use text::{ChatCompletionClient, ChatMessage, ChatRole, TextGenerator};
pub use translate::Translator;
