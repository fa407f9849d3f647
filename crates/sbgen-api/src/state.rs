//! Application state.

use std::sync::Arc;

use anyhow::Context;

use sbgen_ai::{
    ChatCompletionClient, HttpImageClient, ImageGenerator, ImageProviderConfig, ImageSettings,
    ImageSynthesizer, TextGenerator, TextProviderConfig, Translator,
};
use sbgen_pipeline::leads::lead_sink_from_config;
use sbgen_pipeline::{LeadSink, PipelineConfig, StoryboardOrchestrator};

use crate::config::ApiConfig;

/// Which upstream providers have credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderStatus {
    pub text_configured: bool,
    pub image_configured: bool,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub orchestrator: Arc<StoryboardOrchestrator>,
    pub translator: Translator,
    pub providers: ProviderStatus,
}

impl AppState {
    /// Create new application state from environment configuration.
    pub fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let text_config = TextProviderConfig::from_env();
        let image_config = ImageProviderConfig::from_env();
        let pipeline_config = PipelineConfig::from_env();

        let providers = ProviderStatus {
            text_configured: text_config.is_configured(),
            image_configured: image_config.is_configured(),
        };

        let settings = ImageSettings::from(&image_config);
        let text: Arc<dyn TextGenerator> =
            Arc::new(ChatCompletionClient::new(text_config).context("building text provider client")?);
        let images: Arc<dyn ImageGenerator> =
            Arc::new(HttpImageClient::new(image_config).context("building image provider client")?);
        let leads = lead_sink_from_config(&pipeline_config).context("building lead sink")?;

        Ok(Self::with_providers(
            config,
            pipeline_config,
            text,
            images,
            settings,
            leads,
            providers,
        ))
    }

    /// Assemble state from already-built providers.
    pub fn with_providers(
        config: ApiConfig,
        pipeline_config: PipelineConfig,
        text: Arc<dyn TextGenerator>,
        images: Arc<dyn ImageGenerator>,
        image_settings: ImageSettings,
        leads: Arc<dyn LeadSink>,
        providers: ProviderStatus,
    ) -> Self {
        let translator = Translator::new(Arc::clone(&text));
        let synthesizer = Arc::new(ImageSynthesizer::new(images, translator.clone(), image_settings));
        let orchestrator = Arc::new(StoryboardOrchestrator::new(text, synthesizer, leads, pipeline_config));

        Self {
            config,
            orchestrator,
            translator,
            providers,
        }
    }
}
