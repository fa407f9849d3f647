//! Storyboard orchestrator.
//!
//! One run moves through
//! `Validating -> GeneratingText -> EnhancingVisuals -> SynthesizingImages
//! -> Aggregating -> Persisting -> Completed`, with `Errored` reachable from
//! any stage before `Completed`. Text-model failures fall back to a
//! deterministic storyboard and image failures fall back to placeholders, so
//! only validation errors and unexpected failures end a run with an `error`
//! event.

use std::sync::Arc;

use futures_util::future::join_all;
use futures_util::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, Instrument};

use sbgen_ai::image::{ImageKind, ImageReference};
use sbgen_ai::prompt::{self, STORYBOARD_SYSTEM_PROMPT, VISUAL_ENHANCEMENT_SYSTEM_PROMPT};
use sbgen_ai::{extract_frames, AiError, AiResult, ImageSynthesizer, TextGenerator};
use sbgen_models::{
    BriefPayload, BudgetEstimator, CreativeBrief, GeneratedStoryboard, LeadRecord, OutputLanguage,
    ProgressEvent, RunId, StoryboardFrame,
};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::fallback::fallback_frames;
use crate::leads::LeadSink;
use crate::logging::RunLogger;
use crate::sink::EventSink;
use crate::summary::build_summary;

/// Number of user-visible steps reported in progress events.
pub const TOTAL_STEPS: u8 = 4;

const PERCENT_ANALYZING: u8 = 10;
const PERCENT_GENERATING: u8 = 30;
const PERCENT_VISUALS: u8 = 60;
const PERCENT_VISUALS_DONE: u8 = 85;
const PERCENT_FINALIZING: u8 = 90;
const PERCENT_COMPLETE: u8 = 100;

const METRIC_RUNS: &str = "sbgen_runs_total";
const METRIC_FALLBACKS: &str = "sbgen_text_fallbacks_total";
const METRIC_IMAGES: &str = "sbgen_images_total";

/// Stage of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Validating,
    GeneratingText,
    EnhancingVisuals,
    SynthesizingImages,
    Aggregating,
    Persisting,
    Completed,
    Errored,
}

impl RunStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStage::Validating => "validating",
            RunStage::GeneratingText => "generating_text",
            RunStage::EnhancingVisuals => "enhancing_visuals",
            RunStage::SynthesizingImages => "synthesizing_images",
            RunStage::Aggregating => "aggregating",
            RunStage::Persisting => "persisting",
            RunStage::Completed => "completed",
            RunStage::Errored => "errored",
        }
    }

    fn message(&self, language: OutputLanguage) -> &'static str {
        match (self, language) {
            (RunStage::Validating, OutputLanguage::En) => "Analyzing your creative brief...",
            (RunStage::Validating, OutputLanguage::Zh) => "正在分析创意需求...",
            (RunStage::GeneratingText, OutputLanguage::En) => "Generating storyboard content...",
            (RunStage::GeneratingText, OutputLanguage::Zh) => "正在生成分镜内容...",
            (RunStage::EnhancingVisuals | RunStage::SynthesizingImages, OutputLanguage::En) => {
                "Creating visuals..."
            }
            (RunStage::EnhancingVisuals | RunStage::SynthesizingImages, OutputLanguage::Zh) => {
                "正在生成分镜画面..."
            }
            (RunStage::Aggregating | RunStage::Persisting, OutputLanguage::En) => {
                "Finalizing storyboard..."
            }
            (RunStage::Aggregating | RunStage::Persisting, OutputLanguage::Zh) => "正在整理分镜...",
            (RunStage::Completed, OutputLanguage::En) => "Storyboard generated successfully",
            (RunStage::Completed, OutputLanguage::Zh) => "分镜生成成功",
            (RunStage::Errored, OutputLanguage::En) => "Storyboard generation failed",
            (RunStage::Errored, OutputLanguage::Zh) => "分镜生成失败",
        }
    }
}

/// Where a run's frames came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSource {
    Model,
    Fallback,
}

/// Drives one brief through the whole pipeline.
pub struct StoryboardOrchestrator {
    text: Arc<dyn TextGenerator>,
    images: Arc<ImageSynthesizer>,
    leads: Arc<dyn LeadSink>,
    config: PipelineConfig,
}

impl StoryboardOrchestrator {
    pub fn new(
        text: Arc<dyn TextGenerator>,
        images: Arc<ImageSynthesizer>,
        leads: Arc<dyn LeadSink>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            text,
            images,
            leads,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline in a background task.
    ///
    /// A panic inside the run is reported to `sink` as an `error` event.
    pub fn spawn_run(
        self: &Arc<Self>,
        payload: BriefPayload,
        fallback_language: OutputLanguage,
        sink: Arc<dyn EventSink>,
    ) -> JoinHandle<()> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            let run_sink = Arc::clone(&sink);
            let run = tokio::spawn(async move {
                // Outcome is already reported through the sink.
                let _ = orchestrator.run(&payload, fallback_language, run_sink.as_ref()).await;
            });

            if let Err(join_error) = run.await {
                error!("Storyboard run aborted: {}", join_error);
                metrics::counter!(METRIC_RUNS, "outcome" => "internal_error").increment(1);
                sink.emit(ProgressEvent::error_with_detail(
                    RunStage::Errored.message(fallback_language),
                    "unexpected internal failure",
                ));
            }
        })
    }

    /// Run the pipeline, reporting to `sink`.
    ///
    /// Exactly one terminal event is emitted. Validation failures emit only
    /// the `error` event.
    pub async fn run(
        &self,
        payload: &BriefPayload,
        fallback_language: OutputLanguage,
        sink: &dyn EventSink,
    ) -> PipelineResult<GeneratedStoryboard> {
        let run_id = RunId::new();
        let logger = RunLogger::new(&run_id, "storyboard");
        let span = logger.create_span();

        async {
            let brief = match payload.validate(fallback_language) {
                Ok(brief) => brief,
                Err(e) => {
                    logger.log_warning(&format!("Brief rejected: {}", e));
                    metrics::counter!(METRIC_RUNS, "outcome" => "invalid").increment(1);
                    sink.emit(ProgressEvent::error(e.to_string()));
                    return Err(PipelineError::from(e));
                }
            };

            logger.log_start(&format!(
                "{} for {} ({})",
                brief.project_type, brief.brand_name, brief.output_language
            ));

            match self.run_brief(&brief, sink, &logger).await {
                Ok(storyboard) => {
                    metrics::counter!(METRIC_RUNS, "outcome" => "completed").increment(1);
                    logger.log_completion(&format!(
                        "{} frames, {}s",
                        storyboard.frame_count(),
                        storyboard.total_duration_seconds
                    ));
                    Ok(storyboard)
                }
                Err(e) => {
                    logger.log_error(&e.to_string());
                    metrics::counter!(METRIC_RUNS, "outcome" => "internal_error").increment(1);
                    sink.emit(ProgressEvent::error_with_detail(
                        RunStage::Errored.message(brief.output_language),
                        e.to_string(),
                    ));
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run_brief(
        &self,
        brief: &CreativeBrief,
        sink: &dyn EventSink,
        logger: &RunLogger,
    ) -> PipelineResult<GeneratedStoryboard> {
        let language = brief.output_language;
        let progress = |step: u8, stage: RunStage, percent: u8| {
            logger.log_progress(&format!("{} ({}%)", stage.as_str(), percent));
            sink.emit(ProgressEvent::progress(step, TOTAL_STEPS, stage.message(language), percent));
        };

        progress(1, RunStage::Validating, PERCENT_ANALYZING);

        progress(2, RunStage::GeneratingText, PERCENT_GENERATING);
        let (frames, source) = self.generate_storyboard_text(brief, logger).await;
        if source == FrameSource::Fallback {
            metrics::counter!(METRIC_FALLBACKS).increment(1);
        }
        for frame in &frames {
            sink.emit(ProgressEvent::content(scene_line(frame, language)));
        }

        progress(3, RunStage::SynthesizingImages, PERCENT_VISUALS);
        let prompts = if self.config.enhance_visuals {
            self.enhance_visuals(brief, &frames, logger).await
        } else {
            frames.iter().map(image_prompt).collect()
        };
        let frames = self.synthesize_images(frames, prompts, language, sink, logger).await?;

        progress(4, RunStage::Aggregating, PERCENT_FINALIZING);
        let total = GeneratedStoryboard::total_of(&frames);
        let budget = BudgetEstimator::estimate(brief.budget_tier, total, brief.project_type);
        let summary = build_summary(brief, frames.len(), total, &budget);
        let storyboard = GeneratedStoryboard::assemble(frames, summary, budget);
        sink.emit(ProgressEvent::content(storyboard.summary.clone()));

        let persisting = self.hand_off_lead(brief, &storyboard, logger);

        sink.emit(ProgressEvent::progress(
            TOTAL_STEPS,
            TOTAL_STEPS,
            RunStage::Completed.message(language),
            PERCENT_COMPLETE,
        ));
        sink.emit(ProgressEvent::complete(
            storyboard.clone(),
            RunStage::Completed.message(language),
        ));

        if let Some(handle) = persisting {
            if let Err(e) = handle.await {
                logger.log_warning(&format!("Lead persistence task failed: {}", e));
            }
        }

        Ok(storyboard)
    }

    /// Generate frames with the text model, falling back to the deterministic
    /// storyboard on any model or extraction failure.
    pub async fn generate_storyboard_text(
        &self,
        brief: &CreativeBrief,
        logger: &RunLogger,
    ) -> (Vec<StoryboardFrame>, FrameSource) {
        match self.generate_frames(brief).await {
            Ok(frames) => (frames, FrameSource::Model),
            Err(e) => {
                logger.log_warning(&format!("Text generation failed ({}), using fallback storyboard: {}", e.kind(), e));
                (fallback_frames(brief), FrameSource::Fallback)
            }
        }
    }

    async fn generate_frames(&self, brief: &CreativeBrief) -> AiResult<Vec<StoryboardFrame>> {
        let directive = prompt::language_directive(brief.output_language);
        let rendered = prompt::render(brief, &directive);
        let raw = self.text.generate(&rendered, Some(STORYBOARD_SYSTEM_PROMPT)).await?;
        debug!(chars = raw.len(), "Received storyboard completion");

        let mut frames = extract_frames(&raw)?;
        frames.sort_by_key(|f| f.id);
        Ok(frames)
    }

    /// Best-effort rewrite of each frame's visual into a richer image prompt.
    async fn enhance_visuals(
        &self,
        brief: &CreativeBrief,
        frames: &[StoryboardFrame],
        logger: &RunLogger,
    ) -> Vec<String> {
        join_all(frames.iter().map(|frame| async move {
            let request = prompt::render_visual_enhancement(frame, brief);
            match self
                .text
                .generate(&request, Some(VISUAL_ENHANCEMENT_SYSTEM_PROMPT))
                .await
            {
                Ok(enhanced) => enhanced.trim().to_string(),
                Err(e) => {
                    logger.log_warning(&format!(
                        "Visual enhancement failed for frame {}, keeping original: {}",
                        frame.id, e
                    ));
                    image_prompt(frame)
                }
            }
        }))
        .await
    }

    /// Synthesize one image per frame with bounded concurrency.
    ///
    /// Every frame ends up with exactly one image reference; failures become
    /// placeholders. Only a crashed frame task fails the run.
    async fn synthesize_images(
        &self,
        mut frames: Vec<StoryboardFrame>,
        prompts: Vec<String>,
        language: OutputLanguage,
        sink: &dyn EventSink,
        logger: &RunLogger,
    ) -> PipelineResult<Vec<StoryboardFrame>> {
        let total = frames.len();
        let semaphore = Arc::new(Semaphore::new(self.config.max_image_parallel.max(1)));
        let size = self.images.settings().size;

        let mut tasks: FuturesUnordered<JoinHandle<PipelineResult<FrameImage>>> = frames
            .iter()
            .zip(prompts)
            .enumerate()
            .map(|(index, (frame, prompt))| {
                let images = Arc::clone(&self.images);
                let semaphore = Arc::clone(&semaphore);
                let description = if frame.description.trim().is_empty() {
                    frame.visual.clone()
                } else {
                    frame.description.clone()
                };

                tokio::spawn(async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| PipelineError::internal("image semaphore closed"))?;
                    let (reference, failure) = images
                        .synthesize_or_placeholder(&prompt, &description, size, language)
                        .await;
                    Ok(FrameImage {
                        index,
                        reference,
                        failure,
                    })
                })
            })
            .collect();

        let mut done = 0usize;
        while let Some(joined) = tasks.next().await {
            let result = joined
                .map_err(|e| PipelineError::internal(format!("image task failed: {}", e)))??;
            done += 1;

            let frame = &mut frames[result.index];
            record_image_outcome(&result, frame.id, logger);
            frame.attach_image(result.reference.uri);

            let percent = PERCENT_VISUALS
                + ((PERCENT_VISUALS_DONE - PERCENT_VISUALS) as usize * done / total.max(1)) as u8;
            sink.emit(ProgressEvent::progress(
                3,
                TOTAL_STEPS,
                visual_progress_message(done, total, language),
                percent,
            ));
        }

        Ok(frames)
    }

    /// Start persisting the lead, if the brief has contact info.
    fn hand_off_lead(
        &self,
        brief: &CreativeBrief,
        storyboard: &GeneratedStoryboard,
        logger: &RunLogger,
    ) -> Option<JoinHandle<()>> {
        let lead = LeadRecord::from_run(brief, storyboard)?;
        let leads = Arc::clone(&self.leads);
        let logger = logger.clone();
        logger.log_progress(&format!("{} (lead {} via {})", RunStage::Persisting.as_str(), lead.id, leads.name()));

        Some(tokio::spawn(async move {
            if let Err(e) = leads.persist(&lead).await {
                logger.log_warning(&format!("Lead {} not persisted: {}", lead.id, e));
            }
        }))
    }
}

struct FrameImage {
    index: usize,
    reference: ImageReference,
    failure: Option<AiError>,
}

fn record_image_outcome(result: &FrameImage, frame_id: u32, logger: &RunLogger) {
    let kind = match result.reference.kind {
        ImageKind::Generated => "generated",
        ImageKind::Placeholder(reason) => reason.as_str(),
    };
    metrics::counter!(METRIC_IMAGES, "kind" => kind).increment(1);

    match (&result.failure, result.reference.kind) {
        (Some(e), _) => logger.log_warning(&format!(
            "Image for frame {} failed ({}), using placeholder: {}",
            frame_id,
            e.kind(),
            e
        )),
        (None, ImageKind::Placeholder(reason)) => logger.log_warning(&format!(
            "Image for frame {} replaced by placeholder ({})",
            frame_id,
            reason.as_str()
        )),
        (None, ImageKind::Generated) => {
            debug!(frame_id, "Image generated");
        }
    }
}

/// Text sent to the image model when no enhancement runs.
fn image_prompt(frame: &StoryboardFrame) -> String {
    if frame.visual.trim().is_empty() {
        frame.description.clone()
    } else {
        frame.visual.clone()
    }
}

fn scene_line(frame: &StoryboardFrame, language: OutputLanguage) -> String {
    match language {
        OutputLanguage::En => format!("Scene {}: {}", frame.id, frame.description),
        OutputLanguage::Zh => format!("场景 {}：{}", frame.id, frame.description),
    }
}

fn visual_progress_message(done: usize, total: usize, language: OutputLanguage) -> String {
    match language {
        OutputLanguage::En => format!("Created visual {}/{}", done, total),
        OutputLanguage::Zh => format!("已生成画面 {}/{}", done, total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leads::LeadSink;
    use crate::sink::RecordingSink;
    use async_trait::async_trait;
    use sbgen_ai::image::{ImagePayload, ImageRequest, ImageSettings};
    use sbgen_ai::text::ChatMessage;
    use sbgen_ai::{ImageGenerator, Translator};
    use sbgen_models::{ContactInfo, ProgressEventType, TargetAudience};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const FOUR_SCENES: &str = r#"Sure! Here is your storyboard:
```json
[
  {"id": 1, "description": "Opening", "visual": "Dawn over a city skyline", "duration": 5, "camera": "wide", "audio": "synth pad"},
  {"id": 2, "description": "Problem", "visual": "Flat sound from a laptop", "duration": 7.5, "camera": "medium", "audio": "muffled"},
  {"id": 3, "description": "Reveal", "visual": "The Acme speaker on a desk", "duration": 10, "camera": "close-up", "audio": "bass drop"},
  {"id": 4, "description": "Payoff", "visual": "Friends dancing", "duration": 6, "camera": "handheld", "audio": "voice-over"}
]
```"#;

    /// Text model returning a fixed completion, or failing when `None`.
    struct FixedText(Option<&'static str>);

    #[async_trait]
    impl TextGenerator for FixedText {
        async fn complete(&self, _messages: &[ChatMessage]) -> AiResult<String> {
            match self.0 {
                Some(text) => Ok(text.to_string()),
                None => Err(AiError::unavailable("connection refused")),
            }
        }
    }

    /// Image model that fails for prompts containing `fail_marker`.
    struct Images {
        fail_marker: Option<&'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageGenerator for Images {
        async fn generate(&self, request: &ImageRequest) -> AiResult<ImagePayload> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.fail_marker {
                Some(marker) if request.prompt.contains(marker) => Err(AiError::unavailable("503")),
                _ => Ok(ImagePayload::Url(format!("https://images.test/{}.png", n))),
            }
        }
    }

    #[derive(Default)]
    struct RecordingLeads(Mutex<Vec<LeadRecord>>);

    #[async_trait]
    impl LeadSink for RecordingLeads {
        async fn persist(&self, lead: &LeadRecord) -> PipelineResult<()> {
            self.0.lock().unwrap().push(lead.clone());
            Ok(())
        }

        fn name(&self) -> &'static str {
            "memory"
        }
    }

    struct FailingLeads;

    #[async_trait]
    impl LeadSink for FailingLeads {
        async fn persist(&self, _lead: &LeadRecord) -> PipelineResult<()> {
            Err(PipelineError::lead_persistence("disk full"))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    fn orchestrator(
        text: Option<&'static str>,
        fail_marker: Option<&'static str>,
        leads: Arc<dyn LeadSink>,
    ) -> StoryboardOrchestrator {
        let text: Arc<dyn TextGenerator> = Arc::new(FixedText(text));
        let images = ImageSynthesizer::new(
            Arc::new(Images {
                fail_marker,
                calls: AtomicUsize::new(0),
            }),
            Translator::new(Arc::clone(&text)),
            ImageSettings::default(),
        );
        StoryboardOrchestrator::new(text, Arc::new(images), leads, PipelineConfig::default())
    }

    fn acme_brief() -> BriefPayload {
        BriefPayload {
            project_type: Some("tvc".into()),
            industry: Some("technology".into()),
            target_audience: Some(TargetAudience::Text("young adults".into())),
            brand_name: Some("Acme".into()),
            product_description: Some("smart speaker".into()),
            key_message: Some("sound that moves you".into()),
            tone: Some("energetic".into()),
            duration: Some("30s".into()),
            budget: Some("medium".into()),
            output_language: Some("en".into()),
            contact_info: Some(ContactInfo {
                name: "A".into(),
                email: "a@b.com".into(),
                phone: None,
                company: None,
            }),
        }
    }

    fn terminal_count(sink: &RecordingSink) -> usize {
        sink.events().iter().filter(|e| e.is_terminal()).count()
    }

    fn assert_monotonic_percent(sink: &RecordingSink) {
        let percents: Vec<u8> = sink.events().iter().filter_map(ProgressEvent::percent).collect();
        assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{:?}", percents);
    }

    #[tokio::test]
    async fn test_end_to_end_success() {
        let leads = Arc::new(RecordingLeads::default());
        let orchestrator = orchestrator(Some(FOUR_SCENES), None, leads.clone());
        let sink = RecordingSink::new();

        let board = orchestrator.run(&acme_brief(), OutputLanguage::En, &sink).await.unwrap();

        assert_eq!(board.frames.len(), 4);
        assert_eq!(board.total_duration_seconds, 5.0 + 7.5 + 10.0 + 6.0);
        for frame in &board.frames {
            let url = frame.image_url.as_deref().unwrap();
            assert!(!ImageReference::is_placeholder_uri(url));
        }

        let events = sink.events();
        assert_eq!(terminal_count(&sink), 1);
        assert_eq!(events.last().map(ProgressEvent::event_type), Some(ProgressEventType::Complete));
        assert_monotonic_percent(&sink);
        assert!(events.contains(&ProgressEvent::content("Scene 3: Reveal")));

        match events.last() {
            Some(ProgressEvent::Complete { storyboard, .. }) => assert_eq!(storyboard, &board),
            other => panic!("unexpected terminal event: {:?}", other),
        }

        let leads = leads.0.lock().unwrap();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].frame_count, 4);
        assert_eq!(leads[0].email, "a@b.com");
    }

    #[tokio::test]
    async fn test_single_image_failure_uses_placeholder() {
        let orchestrator = orchestrator(Some(FOUR_SCENES), Some("Acme speaker"), Arc::new(RecordingLeads::default()));
        let sink = RecordingSink::new();

        let board = orchestrator.run(&acme_brief(), OutputLanguage::En, &sink).await.unwrap();

        assert_eq!(board.frames.len(), 4);
        for frame in &board.frames {
            let url = frame.image_url.as_deref().unwrap();
            assert_eq!(ImageReference::is_placeholder_uri(url), frame.id == 3, "frame {}", frame.id);
        }
        assert_eq!(sink.event_types().last(), Some(&ProgressEventType::Complete));
        assert_eq!(terminal_count(&sink), 1);
    }

    #[tokio::test]
    async fn test_missing_fields_emit_only_error() {
        let orchestrator = orchestrator(Some(FOUR_SCENES), None, Arc::new(RecordingLeads::default()));
        let sink = RecordingSink::new();
        let payload = BriefPayload {
            brand_name: Some("   ".into()),
            tone: None,
            ..acme_brief()
        };

        let err = orchestrator.run(&payload, OutputLanguage::En, &sink).await.unwrap_err();

        assert!(err.is_validation());
        assert_eq!(sink.event_types(), vec![ProgressEventType::Error]);
        match &sink.events()[0] {
            ProgressEvent::Error { message, .. } => {
                assert!(message.contains("brandName"));
                assert!(message.contains("tone"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_text_failure_uses_deterministic_fallback() {
        let orchestrator = orchestrator(None, None, Arc::new(RecordingLeads::default()));
        let brief = acme_brief().validate(OutputLanguage::En).unwrap();
        let logger = RunLogger::new(&RunId::new(), "test");

        let (first, source) = orchestrator.generate_storyboard_text(&brief, &logger).await;
        let (second, _) = orchestrator.generate_storyboard_text(&brief, &logger).await;

        assert_eq!(source, FrameSource::Fallback);
        assert!(!first.is_empty());
        assert_eq!(first, second);
        assert_eq!(first, fallback_frames(&brief));
    }

    #[tokio::test]
    async fn test_garbage_completion_still_completes() {
        let orchestrator = orchestrator(Some("I cannot help with that."), None, Arc::new(RecordingLeads::default()));
        let sink = RecordingSink::new();

        let board = orchestrator.run(&acme_brief(), OutputLanguage::En, &sink).await.unwrap();

        assert_eq!(board.frames.len(), 4);
        assert_eq!(board.total_duration_seconds, GeneratedStoryboard::total_of(&board.frames));
        assert_eq!(sink.event_types().last(), Some(&ProgressEventType::Complete));
        assert_monotonic_percent(&sink);
    }

    #[tokio::test]
    async fn test_lead_failure_does_not_block_completion() {
        let orchestrator = orchestrator(Some(FOUR_SCENES), None, Arc::new(FailingLeads));
        let sink = RecordingSink::new();

        let result = orchestrator.run(&acme_brief(), OutputLanguage::En, &sink).await;

        assert!(result.is_ok());
        assert_eq!(sink.event_types().last(), Some(&ProgressEventType::Complete));
    }

    #[tokio::test]
    async fn test_no_contact_info_skips_lead() {
        let leads = Arc::new(RecordingLeads::default());
        let orchestrator = orchestrator(Some(FOUR_SCENES), None, leads.clone());
        let payload = BriefPayload {
            contact_info: None,
            ..acme_brief()
        };

        orchestrator.run(&payload, OutputLanguage::En, &RecordingSink::new()).await.unwrap();

        assert!(leads.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_spawn_run_streams_through_channel() {
        let orchestrator = Arc::new(orchestrator(Some(FOUR_SCENES), None, Arc::new(RecordingLeads::default())));
        let (sink, mut rx) = crate::sink::ChannelSink::new();

        let handle = orchestrator.spawn_run(acme_brief(), OutputLanguage::En, Arc::new(sink));

        let mut types = Vec::new();
        while let Some(event) = rx.recv().await {
            types.push(event.event_type());
        }
        handle.await.unwrap();

        assert_eq!(types.first(), Some(&ProgressEventType::Progress));
        assert_eq!(types.last(), Some(&ProgressEventType::Complete));
    }

    #[tokio::test]
    async fn test_chinese_run_reports_chinese_progress() {
        let orchestrator = orchestrator(None, None, Arc::new(RecordingLeads::default()));
        let sink = RecordingSink::new();
        let payload = BriefPayload {
            output_language: None,
            ..acme_brief()
        };

        let board = orchestrator.run(&payload, OutputLanguage::Zh, &sink).await.unwrap();

        assert!(board.summary.contains("Acme"));
        match &sink.events()[0] {
            ProgressEvent::Progress { message, step, total_steps, .. } => {
                assert_eq!(message, "正在分析创意需求...");
                assert_eq!((*step, *total_steps), (1, TOTAL_STEPS));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    /// Text model that rewrites visuals, except for dance scenes.
    struct EnhancingText;

    #[async_trait]
    impl TextGenerator for EnhancingText {
        async fn complete(&self, messages: &[ChatMessage]) -> AiResult<String> {
            let is_enhancement = messages
                .first()
                .is_some_and(|m| m.content == VISUAL_ENHANCEMENT_SYSTEM_PROMPT);
            if !is_enhancement {
                return Ok(FOUR_SCENES.to_string());
            }
            let request = messages.last().map(|m| m.content.as_str()).unwrap_or_default();
            let visual = request
                .lines()
                .find_map(|line| line.strip_prefix("Visual: "))
                .unwrap_or_default();
            if visual.contains("dancing") {
                return Err(AiError::unavailable("timeout"));
            }
            Ok(format!("  Enhanced: {}\n", visual))
        }
    }

    #[derive(Default)]
    struct PromptLog(Mutex<Vec<String>>);

    #[async_trait]
    impl ImageGenerator for PromptLog {
        async fn generate(&self, request: &ImageRequest) -> AiResult<ImagePayload> {
            self.0.lock().unwrap().push(request.prompt.clone());
            Ok(ImagePayload::Url("https://images.test/frame.png".to_string()))
        }
    }

    #[tokio::test]
    async fn test_enhanced_visuals_reach_image_provider() {
        let text: Arc<dyn TextGenerator> = Arc::new(EnhancingText);
        let log = Arc::new(PromptLog::default());
        let images = ImageSynthesizer::new(
            log.clone(),
            Translator::new(Arc::clone(&text)),
            ImageSettings::default(),
        );
        let config = PipelineConfig {
            enhance_visuals: true,
            ..PipelineConfig::default()
        };
        let orchestrator = StoryboardOrchestrator::new(
            text,
            Arc::new(images),
            Arc::new(RecordingLeads::default()),
            config,
        );
        let sink = RecordingSink::new();

        let board = orchestrator.run(&acme_brief(), OutputLanguage::En, &sink).await.unwrap();

        let mut prompts = log.0.lock().unwrap().clone();
        prompts.sort();
        assert_eq!(
            prompts,
            vec![
                "Enhanced: Dawn over a city skyline",
                "Enhanced: Flat sound from a laptop",
                "Enhanced: The Acme speaker on a desk",
                "Friends dancing",
            ]
        );
        assert_eq!(board.frames[0].visual, "Dawn over a city skyline");
        assert_eq!(board.frames[3].visual, "Friends dancing");
        assert_eq!(terminal_count(&sink), 1);
    }
}
