//! Image synthesis.
//!
//! [`HttpImageClient`] talks to an OpenAI-style `/images/generations`
//! endpoint. [`ImageSynthesizer`] wraps any [`ImageGenerator`] with the
//! per-frame policy: translate to English when needed, truncate to the
//! provider limit, substitute a placeholder on moderation rejections, and
//! retry once after forced translation on language rejections.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use sbgen_models::OutputLanguage;

use crate::config::ImageProviderConfig;
use crate::error::{AiError, AiResult};
use crate::language::needs_translation_for_image;
use crate::translate::Translator;

/// Prefix of every placeholder reference.
pub const PLACEHOLDER_URI_PREFIX: &str = "data:image/svg+xml;x-placeholder=1;base64,";

/// Output dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for ImageSize {
    fn default() -> Self {
        Self::new(1024, 576)
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A single generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub guidance_scale: f32,
    pub samples: u32,
}

/// What the provider returned.
#[derive(Debug, Clone, PartialEq)]
pub enum ImagePayload {
    Url(String),
    Base64 { data: String, mime: String },
}

impl ImagePayload {
    /// Directly embeddable reference (URL or data URI).
    pub fn into_reference(self) -> String {
        match self {
            ImagePayload::Url(url) => url,
            ImagePayload::Base64 { data, .. } if data.starts_with("data:") => data,
            ImagePayload::Base64 { data, mime } => format!("data:{};base64,{}", mime, data),
        }
    }
}

/// A provider that turns one prompt into one image.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, request: &ImageRequest) -> AiResult<ImagePayload>;
}

/// Classify a provider failure from its HTTP status and body.
///
/// Moderation markers win over language markers; 429 and 5xx without either
/// marker are transient upstream failures.
pub fn classify_image_error(status: u16, body: &str) -> AiError {
    const MODERATION_MARKERS: [&str; 8] = [
        "content_policy",
        "content policy",
        "moderation",
        "sensitive",
        "nsfw",
        "unsafe",
        "safety",
        "violat",
    ];
    const LANGUAGE_MARKERS: [&str; 4] = ["english", "language", "non-ascii", "unsupported character"];

    let lower = body.to_lowercase();
    let detail = format!("status {}: {}", status, body.trim());

    if MODERATION_MARKERS.iter().any(|m| lower.contains(m)) {
        AiError::ContentModerationRejected(detail)
    } else if LANGUAGE_MARKERS.iter().any(|m| lower.contains(m)) {
        AiError::LanguageRejected(detail)
    } else if status == 429 || status >= 500 {
        AiError::UpstreamUnavailable(detail)
    } else {
        AiError::ImageSynthesisFailed(detail)
    }
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    width: u32,
    height: u32,
    size: String,
    steps: u32,
    guidance_scale: f32,
    n: u32,
    response_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    #[serde(default)]
    b64_json: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// HTTP client for an OpenAI-style image generation endpoint.
pub struct HttpImageClient {
    http: Client,
    config: ImageProviderConfig,
}

impl HttpImageClient {
    pub fn new(config: ImageProviderConfig) -> AiResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AiError::NotConfigured(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    pub fn from_env() -> AiResult<Self> {
        Self::new(ImageProviderConfig::from_env())
    }

    pub fn config(&self) -> &ImageProviderConfig {
        &self.config
    }
}

#[async_trait]
impl ImageGenerator for HttpImageClient {
    async fn generate(&self, request: &ImageRequest) -> AiResult<ImagePayload> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| AiError::NotConfigured("IMAGE_API_KEY is not set".to_string()))?;

        let url = format!("{}/images/generations", self.config.base_url.trim_end_matches('/'));
        let body = GenerationRequest {
            model: &self.config.model,
            prompt: &request.prompt,
            width: request.width,
            height: request.height,
            size: format!("{}x{}", request.width, request.height),
            steps: request.steps,
            guidance_scale: request.guidance_scale,
            n: request.samples,
            response_format: "b64_json",
        };

        debug!(model = %self.config.model, "Sending image generation request to {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::unavailable(format!("image request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_image_error(status.as_u16(), &text));
        }

        let parsed: GenerationResponse = response
            .json()
            .await
            .map_err(|e| AiError::image_failed(format!("unreadable response body: {}", e)))?;

        let image = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| AiError::image_failed("provider returned no images"))?;

        match (image.b64_json, image.url) {
            (Some(data), _) if !data.is_empty() => Ok(ImagePayload::Base64 {
                data,
                mime: "image/png".to_string(),
            }),
            (_, Some(url)) if !url.is_empty() => Ok(ImagePayload::Url(url)),
            _ => Err(AiError::image_failed("image entry had neither data nor url")),
        }
    }
}

/// Why a placeholder was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderReason {
    ContentModeration,
    SynthesisFailed,
}

impl PlaceholderReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceholderReason::ContentModeration => "content_moderation",
            PlaceholderReason::SynthesisFailed => "synthesis_failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Generated,
    Placeholder(PlaceholderReason),
}

/// Reference attached to a frame: a real image or a labelled placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageReference {
    pub uri: String,
    pub kind: ImageKind,
}

impl ImageReference {
    pub fn generated(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            kind: ImageKind::Generated,
        }
    }

    /// SVG placeholder labelled "Image unavailable" and carrying `description`.
    pub fn placeholder(description: &str, reason: PlaceholderReason, size: ImageSize) -> Self {
        let caption: String = description.chars().take(90).collect();
        let svg = format!(
            concat!(
                r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"##,
                r##"<rect width="100%" height="100%" fill="#e5e7eb"/>"##,
                r##"<text x="50%" y="44%" text-anchor="middle" font-family="sans-serif" font-size="28" fill="#374151">Image unavailable</text>"##,
                r##"<text x="50%" y="56%" text-anchor="middle" font-family="sans-serif" font-size="18" fill="#6b7280">{caption}</text>"##,
                r##"</svg>"##
            ),
            w = size.width,
            h = size.height,
            caption = escape_xml(&caption),
        );

        Self {
            uri: format!("{}{}", PLACEHOLDER_URI_PREFIX, BASE64.encode(svg)),
            kind: ImageKind::Placeholder(reason),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, ImageKind::Placeholder(_))
    }

    /// Whether a serialized `imageUrl` is a placeholder reference.
    pub fn is_placeholder_uri(uri: &str) -> bool {
        uri.starts_with(PLACEHOLDER_URI_PREFIX)
    }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn is_sentence_end(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '。' | '！' | '？')
}

fn is_comma(c: char) -> bool {
    matches!(c, ',' | '，' | '、')
}

/// Truncate `prompt` to at most `max_chars` characters.
///
/// Cut points are searched in the last 20% of the limit, preferring the last
/// sentence end, then the last comma, then the last whitespace. Without any
/// cut point the prompt is hard-cut at the limit.
pub fn truncate_prompt(prompt: &str, max_chars: usize) -> String {
    let prompt = prompt.trim();
    let chars: Vec<char> = prompt.chars().collect();
    if chars.len() <= max_chars {
        return prompt.to_string();
    }

    let head = &chars[..max_chars];
    if chars[max_chars].is_whitespace() {
        return head.iter().collect::<String>().trim_end().to_string();
    }

    let window_start = max_chars * 4 / 5;
    let last_in_window = |pred: fn(char) -> bool| {
        head.iter()
            .enumerate()
            .skip(window_start)
            .rev()
            .find(|(_, c)| pred(**c))
            .map(|(i, _)| i)
    };

    let end = last_in_window(is_sentence_end)
        .or_else(|| last_in_window(is_comma))
        .map(|i| i + 1)
        .or_else(|| last_in_window(char::is_whitespace))
        .unwrap_or(max_chars);

    head[..end].iter().collect::<String>().trim_end().to_string()
}

/// Fixed generation parameters applied to every request.
#[derive(Debug, Clone)]
pub struct ImageSettings {
    pub size: ImageSize,
    pub steps: u32,
    pub guidance_scale: f32,
    pub max_prompt_chars: usize,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self::from(&ImageProviderConfig::default())
    }
}

impl From<&ImageProviderConfig> for ImageSettings {
    fn from(config: &ImageProviderConfig) -> Self {
        Self {
            size: ImageSize::new(config.width, config.height),
            steps: config.steps,
            guidance_scale: config.guidance_scale,
            max_prompt_chars: config.max_prompt_chars,
        }
    }
}

/// Per-frame image synthesis policy over an [`ImageGenerator`].
pub struct ImageSynthesizer {
    provider: Arc<dyn ImageGenerator>,
    translator: Translator,
    settings: ImageSettings,
}

impl ImageSynthesizer {
    pub fn new(provider: Arc<dyn ImageGenerator>, translator: Translator, settings: ImageSettings) -> Self {
        Self {
            provider,
            translator,
            settings,
        }
    }

    pub fn settings(&self) -> &ImageSettings {
        &self.settings
    }

    /// Synthesize one image.
    ///
    /// Moderation rejections resolve to a placeholder labelled with
    /// `description`. Every other failure is returned so the caller can
    /// substitute its own placeholder.
    pub async fn synthesize(
        &self,
        prompt: &str,
        description: &str,
        size: ImageSize,
        language: OutputLanguage,
    ) -> AiResult<ImageReference> {
        let prepared = if needs_translation_for_image(prompt, language) {
            self.translator.translate_forced(prompt, OutputLanguage::En).await
        } else {
            prompt.to_string()
        };

        match self.submit(&prepared, size).await {
            Ok(payload) => Ok(ImageReference::generated(payload.into_reference())),
            Err(AiError::ContentModerationRejected(reason)) => Ok(self.moderated(description, size, &reason)),
            Err(AiError::LanguageRejected(reason)) => {
                info!("Image provider rejected prompt language, retrying after translation: {}", reason);
                let forced = self.translator.translate_forced(&prepared, OutputLanguage::En).await;
                match self.submit(&forced, size).await {
                    Ok(payload) => Ok(ImageReference::generated(payload.into_reference())),
                    Err(AiError::ContentModerationRejected(reason)) => {
                        Ok(self.moderated(description, size, &reason))
                    }
                    Err(e) => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Synthesize one image, turning any failure into a placeholder that
    /// carries `description`. The failure, if any, is returned alongside.
    pub async fn synthesize_or_placeholder(
        &self,
        prompt: &str,
        description: &str,
        size: ImageSize,
        language: OutputLanguage,
    ) -> (ImageReference, Option<AiError>) {
        match self.synthesize(prompt, description, size, language).await {
            Ok(reference) => (reference, None),
            Err(e) => (
                ImageReference::placeholder(description, PlaceholderReason::SynthesisFailed, size),
                Some(e),
            ),
        }
    }

    async fn submit(&self, prompt: &str, size: ImageSize) -> AiResult<ImagePayload> {
        let request = ImageRequest {
            prompt: truncate_prompt(prompt, self.settings.max_prompt_chars),
            width: size.width,
            height: size.height,
            steps: self.settings.steps,
            guidance_scale: self.settings.guidance_scale,
            samples: 1,
        };
        self.provider.generate(&request).await
    }

    fn moderated(&self, description: &str, size: ImageSize, reason: &str) -> ImageReference {
        warn!("Image prompt rejected by content moderation, using placeholder: {}", reason);
        ImageReference::placeholder(description, PlaceholderReason::ContentModeration, size)
    }
}
