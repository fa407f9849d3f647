//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum image synthesis calls in flight per run
    pub max_image_parallel: usize,
    /// Rewrite each frame's visual into a richer image prompt before synthesis
    pub enhance_visuals: bool,
    /// Lead webhook endpoint
    pub lead_webhook_url: Option<String>,
    /// JSON-lines file leads are appended to
    pub lead_log_path: Option<PathBuf>,
    /// Timeout for the lead webhook call
    pub lead_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_image_parallel: 3,
            enhance_visuals: false,
            lead_webhook_url: None,
            lead_log_path: None,
            lead_timeout: Duration::from_secs(10),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            max_image_parallel: std::env::var("PIPELINE_MAX_IMAGE_PARALLEL")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(3),
            enhance_visuals: std::env::var("PIPELINE_ENHANCE_VISUALS")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(false),
            lead_webhook_url: std::env::var("LEAD_WEBHOOK_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            lead_log_path: std::env::var("LEAD_LOG_PATH")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            lead_timeout: Duration::from_secs(
                std::env::var("LEAD_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
        }
    }
}
