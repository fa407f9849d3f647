//! Provider configuration.

use std::time::Duration;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_secret(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Configuration for the chat-completion text provider.
#[derive(Debug, Clone)]
pub struct TextProviderConfig {
    /// Base URL; `/chat/completions` is appended
    pub base_url: String,
    /// Bearer token
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion token cap
    pub max_tokens: u32,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for TextProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepseek.com/v1".to_string(),
            api_key: None,
            model: "deepseek-chat".to_string(),
            temperature: 0.7,
            max_tokens: 4000,
            timeout: Duration::from_secs(60),
        }
    }
}

impl TextProviderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env_or("TEXT_API_BASE_URL", &defaults.base_url),
            api_key: env_secret("TEXT_API_KEY"),
            model: env_or("TEXT_MODEL", &defaults.model),
            temperature: env_parse("TEXT_TEMPERATURE", defaults.temperature),
            max_tokens: env_parse("TEXT_MAX_TOKENS", defaults.max_tokens),
            timeout: Duration::from_secs(env_parse("TEXT_TIMEOUT_SECS", 60)),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Configuration for the image provider.
#[derive(Debug, Clone)]
pub struct ImageProviderConfig {
    /// Base URL; `/images/generations` is appended
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Diffusion steps
    pub steps: u32,
    pub guidance_scale: f32,
    /// Maximum prompt length accepted by the provider, in characters
    pub max_prompt_chars: usize,
    pub timeout: Duration,
}

impl Default for ImageProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.siliconflow.cn/v1".to_string(),
            api_key: None,
            model: "stabilityai/stable-diffusion-xl-base-1.0".to_string(),
            width: 1024,
            height: 576,
            steps: 30,
            guidance_scale: 7.5,
            max_prompt_chars: 1000,
            timeout: Duration::from_secs(120),
        }
    }
}

impl ImageProviderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env_or("IMAGE_API_BASE_URL", &defaults.base_url),
            api_key: env_secret("IMAGE_API_KEY"),
            model: env_or("IMAGE_MODEL", &defaults.model),
            width: env_parse("IMAGE_WIDTH", defaults.width),
            height: env_parse("IMAGE_HEIGHT", defaults.height),
            steps: env_parse("IMAGE_STEPS", defaults.steps),
            guidance_scale: env_parse("IMAGE_GUIDANCE_SCALE", defaults.guidance_scale),
            max_prompt_chars: env_parse("IMAGE_MAX_PROMPT_CHARS", defaults.max_prompt_chars).max(16),
            timeout: Duration::from_secs(env_parse("IMAGE_TIMEOUT_SECS", 120)),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
