//! Storyboard frame and aggregate models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::budget::BudgetEstimate;

/// Duration applied to a frame whose duration is missing or non-positive.
pub const DEFAULT_FRAME_SECONDS: f64 = 5.0;

/// One scene of the storyboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoryboardFrame {
    /// Sequential ID, 1-indexed
    pub id: u32,

    /// Short scene description
    pub description: String,

    /// Detailed visual description used as image-generation input
    pub visual: String,

    /// Scene length in seconds (always positive)
    #[serde(alias = "duration")]
    pub duration_seconds: f64,

    /// Camera direction
    pub camera: String,

    /// Audio / voice-over direction
    pub audio: String,

    /// Image reference, set once after synthesis (real image or placeholder)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl StoryboardFrame {
    /// Create a frame without an image.
    ///
    /// Non-positive or non-finite durations are replaced with
    /// [`DEFAULT_FRAME_SECONDS`].
    pub fn new(
        id: u32,
        description: impl Into<String>,
        visual: impl Into<String>,
        duration_seconds: f64,
        camera: impl Into<String>,
        audio: impl Into<String>,
    ) -> Self {
        Self {
            id,
            description: description.into(),
            visual: visual.into(),
            duration_seconds: normalize_duration(duration_seconds),
            camera: camera.into(),
            audio: audio.into(),
            image_url: None,
        }
    }

    /// Attach the image reference. Only the first call has an effect.
    ///
    /// Returns `false` if an image was already attached.
    pub fn attach_image(&mut self, reference: impl Into<String>) -> bool {
        if self.image_url.is_some() {
            return false;
        }
        self.image_url = Some(reference.into());
        true
    }

    pub fn has_image(&self) -> bool {
        self.image_url.is_some()
    }
}

/// Clamp a model-provided duration to a positive value.
pub fn normalize_duration(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        DEFAULT_FRAME_SECONDS
    }
}

/// The final storyboard delivered to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedStoryboard {
    /// Frames ordered by ascending `id`
    pub frames: Vec<StoryboardFrame>,

    /// Generated summary text
    pub summary: String,

    /// Sum of all frame durations
    pub total_duration_seconds: f64,

    /// Cost estimate for producing the storyboard
    pub estimated_budget: BudgetEstimate,
}

impl GeneratedStoryboard {
    /// Assemble a storyboard, ordering frames by `id` and computing the total
    /// duration from the frames themselves.
    pub fn assemble(
        mut frames: Vec<StoryboardFrame>,
        summary: impl Into<String>,
        estimated_budget: BudgetEstimate,
    ) -> Self {
        frames.sort_by_key(|f| f.id);
        let total_duration_seconds = Self::total_of(&frames);
        Self {
            frames,
            summary: summary.into(),
            total_duration_seconds,
            estimated_budget,
        }
    }

    /// Sum of frame durations, in frame order.
    pub fn total_of(frames: &[StoryboardFrame]) -> f64 {
        frames.iter().map(|f| f.duration_seconds).sum()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BudgetEstimator, BudgetTier, ProjectType};

    fn frame(id: u32, seconds: f64) -> StoryboardFrame {
        StoryboardFrame::new(id, "d", "v", seconds, "c", "a")
    }

    #[test]
    fn test_frame_defaults_non_positive_duration() {
        assert_eq!(frame(1, 0.0).duration_seconds, DEFAULT_FRAME_SECONDS);
        assert_eq!(frame(1, -3.0).duration_seconds, DEFAULT_FRAME_SECONDS);
        assert_eq!(frame(1, f64::NAN).duration_seconds, DEFAULT_FRAME_SECONDS);
        assert_eq!(frame(1, 7.5).duration_seconds, 7.5);
    }

    #[test]
    fn test_attach_image_only_once() {
        let mut f = frame(1, 5.0);
        assert!(f.attach_image("https://img/1.png"));
        assert!(!f.attach_image("https://img/other.png"));
        assert_eq!(f.image_url.as_deref(), Some("https://img/1.png"));
    }

    #[test]
    fn test_assemble_sorts_and_sums() {
        let budget = BudgetEstimator::estimate(BudgetTier::Medium, 18.0, ProjectType::Tvc);
        let board = GeneratedStoryboard::assemble(
            vec![frame(3, 4.0), frame(1, 6.0), frame(2, 8.0)],
            "summary",
            budget,
        );
        let ids: Vec<u32> = board.frames.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(board.total_duration_seconds, 18.0);
        assert_eq!(
            board.total_duration_seconds,
            GeneratedStoryboard::total_of(&board.frames)
        );
    }

    #[test]
    fn test_frame_serialization_camel_case() {
        let json = serde_json::to_value(frame(1, 5.0)).unwrap();
        assert_eq!(json["durationSeconds"], 5.0);
        assert!(json.get("imageUrl").is_none());

        let parsed: StoryboardFrame = serde_json::from_value(serde_json::json!({
            "id": 2, "description": "d", "visual": "v", "duration": 3.0,
            "camera": "c", "audio": "a", "imageUrl": "data:image/png;base64,AA"
        }))
        .unwrap();
        assert_eq!(parsed.duration_seconds, 3.0);
        assert!(parsed.has_image());
    }
}
