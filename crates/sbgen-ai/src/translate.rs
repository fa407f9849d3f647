//! Best-effort translation on top of a [`TextGenerator`].

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, warn};

use sbgen_models::{GeneratedStoryboard, OutputLanguage, StoryboardFrame};

use crate::error::{AiError, AiResult};
use crate::language::is_in_language;
use crate::text::TextGenerator;

fn system_prompt(target: OutputLanguage) -> String {
    format!(
        "You are a professional translator. Translate the user's text into {}. \
Keep the meaning, tone and formatting. Return only the translation without quotes, notes or explanations.",
        target.display_name()
    )
}

/// Translation adapter.
///
/// `translate` never fails: any upstream error returns the input unchanged.
#[derive(Clone)]
pub struct Translator {
    text: Arc<dyn TextGenerator>,
}

impl Translator {
    pub fn new(text: Arc<dyn TextGenerator>) -> Self {
        Self { text }
    }

    /// Translate `text` into `target`, skipping the call when the text already
    /// looks like the target language.
    pub async fn translate(&self, text: &str, target: OutputLanguage) -> String {
        if text.trim().is_empty() || is_in_language(text, target) {
            return text.to_string();
        }
        self.translate_forced(text, target).await
    }

    /// Translate without the already-in-target-language check.
    pub async fn translate_forced(&self, text: &str, target: OutputLanguage) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }
        match self.try_translate(text, target).await {
            Ok(translated) => translated,
            Err(e) => {
                warn!(target_language = %target, "Translation failed, keeping original text: {}", e);
                text.to_string()
            }
        }
    }

    /// Translate and surface failures as [`AiError::TranslationFailed`].
    pub async fn try_translate(&self, text: &str, target: OutputLanguage) -> AiResult<String> {
        debug!(target_language = %target, chars = text.chars().count(), "Translating text");

        let raw = self
            .text
            .generate(text, Some(&system_prompt(target)))
            .await
            .map_err(|e| AiError::TranslationFailed(e.to_string()))?;

        let cleaned = strip_wrapping_quotes(raw.trim());
        if cleaned.is_empty() {
            return Err(AiError::TranslationFailed("empty translation".to_string()));
        }
        Ok(cleaned.to_string())
    }

    /// Translate the textual fields of every frame plus the summary.
    ///
    /// Ids, durations, images and the budget are carried over unchanged.
    pub async fn translate_storyboard(
        &self,
        storyboard: &GeneratedStoryboard,
        target: OutputLanguage,
    ) -> GeneratedStoryboard {
        let frames = join_all(
            storyboard
                .frames
                .iter()
                .map(|frame| self.translate_frame(frame, target)),
        )
        .await;
        let summary = self.translate(&storyboard.summary, target).await;

        GeneratedStoryboard::assemble(frames, summary, storyboard.estimated_budget.clone())
    }

    async fn translate_frame(&self, frame: &StoryboardFrame, target: OutputLanguage) -> StoryboardFrame {
        let (description, visual, camera, audio) = tokio::join!(
            self.translate(&frame.description, target),
            self.translate(&frame.visual, target),
            self.translate(&frame.camera, target),
            self.translate(&frame.audio, target),
        );

        StoryboardFrame {
            description,
            visual,
            camera,
            audio,
            ..frame.clone()
        }
    }
}

fn strip_wrapping_quotes(s: &str) -> &str {
    for (open, close) in [('"', '"'), ('“', '”'), ('「', '」')] {
        if let Some(inner) = s.strip_prefix(open).and_then(|rest| rest.strip_suffix(close)) {
            return inner.trim();
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::ChatMessage;
    use async_trait::async_trait;
    use sbgen_models::{BudgetEstimator, BudgetTier, ProjectType};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Failing;

    #[async_trait]
    impl TextGenerator for Failing {
        async fn complete(&self, _messages: &[ChatMessage]) -> AiResult<String> {
            Err(AiError::unavailable("down"))
        }
    }

    #[derive(Default)]
    struct Upper {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for Upper {
        async fn complete(&self, messages: &[ChatMessage]) -> AiResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(format!("\"[t] {}\"", last))
        }
    }

    #[tokio::test]
    async fn test_failure_returns_original() {
        let translator = Translator::new(Arc::new(Failing));
        let input = "一个阳光明媚的早晨";
        assert_eq!(translator.translate(input, OutputLanguage::En).await, input);
        assert_eq!(translator.translate_forced("Hello", OutputLanguage::En).await, "Hello");
    }

    #[tokio::test]
    async fn test_skips_text_already_in_target() {
        let upper = Arc::new(Upper::default());
        let translator = Translator::new(upper.clone());

        assert_eq!(translator.translate("Plain English", OutputLanguage::En).await, "Plain English");
        assert_eq!(translator.translate("已经是中文", OutputLanguage::Zh).await, "已经是中文");
        assert_eq!(translator.translate("   ", OutputLanguage::Zh).await, "   ");
        assert_eq!(upper.calls.load(Ordering::SeqCst), 0);

        assert_eq!(translator.translate("晨光", OutputLanguage::En).await, "[t] 晨光");
        assert_eq!(upper.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_translate_storyboard_keeps_structure() {
        let translator = Translator::new(Arc::new(Upper::default()));
        let mut frame = StoryboardFrame::new(2, "Open", "Sunrise", 6.0, "wide", "music");
        frame.attach_image("https://img/2.png");
        let board = GeneratedStoryboard::assemble(
            vec![frame, StoryboardFrame::new(1, "Intro", "City", 4.0, "pan", "")],
            "A summary",
            BudgetEstimator::estimate(BudgetTier::Low, 10.0, ProjectType::Social),
        );

        let out = translator.translate_storyboard(&board, OutputLanguage::Zh).await;
        assert_eq!(out.frames.len(), 2);
        assert_eq!(out.frames[0].id, 1);
        assert_eq!(out.frames[0].description, "[t] Intro");
        assert_eq!(out.frames[0].audio, "");
        assert_eq!(out.frames[1].image_url.as_deref(), Some("https://img/2.png"));
        assert_eq!(out.summary, "[t] A summary");
        assert_eq!(out.total_duration_seconds, 10.0);
        assert_eq!(out.estimated_budget, board.estimated_budget);
    }
}
