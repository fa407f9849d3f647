//! Lead persistence.
//!
//! A lead is handed to exactly one sink, chosen at startup: webhook when
//! `LEAD_WEBHOOK_URL` is set, else a JSON-lines file when `LEAD_LOG_PATH` is
//! set, else the log.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

use sbgen_models::LeadRecord;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};

#[async_trait]
pub trait LeadSink: Send + Sync {
    async fn persist(&self, lead: &LeadRecord) -> PipelineResult<()>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Build the configured lead sink.
pub fn lead_sink_from_config(config: &PipelineConfig) -> PipelineResult<Arc<dyn LeadSink>> {
    if let Some(url) = &config.lead_webhook_url {
        let sink = WebhookLeadSink::new(url.clone(), config)?;
        return Ok(Arc::new(sink));
    }
    if let Some(path) = &config.lead_log_path {
        return Ok(Arc::new(JsonlLeadSink::new(path.clone())));
    }
    Ok(Arc::new(LogLeadSink))
}

/// POSTs each lead as JSON.
pub struct WebhookLeadSink {
    http: Client,
    url: String,
}

impl WebhookLeadSink {
    pub fn new(url: String, config: &PipelineConfig) -> PipelineResult<Self> {
        let http = Client::builder()
            .timeout(config.lead_timeout)
            .build()
            .map_err(|e| PipelineError::lead_persistence(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { http, url })
    }
}

#[async_trait]
impl LeadSink for WebhookLeadSink {
    async fn persist(&self, lead: &LeadRecord) -> PipelineResult<()> {
        let response = self
            .http
            .post(&self.url)
            .json(lead)
            .send()
            .await
            .map_err(|e| PipelineError::lead_persistence(format!("webhook request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::lead_persistence(format!(
                "webhook returned {}: {}",
                status, body
            )));
        }

        debug!(lead_id = %lead.id, "Lead delivered to webhook");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}

/// Appends each lead as one JSON line.
pub struct JsonlLeadSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlLeadSink {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LeadSink for JsonlLeadSink {
    async fn persist(&self, lead: &LeadRecord) -> PipelineResult<()> {
        let mut line = serde_json::to_string(lead)
            .map_err(|e| PipelineError::lead_persistence(format!("failed to encode lead: {}", e)))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PipelineError::lead_persistence(format!("{}: {}", parent.display(), e)))?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| PipelineError::lead_persistence(format!("{}: {}", self.path.display(), e)))?;

        file.write_all(line.as_bytes())
            .await
            .map_err(|e| PipelineError::lead_persistence(format!("{}: {}", self.path.display(), e)))?;
        file.flush()
            .await
            .map_err(|e| PipelineError::lead_persistence(format!("{}: {}", self.path.display(), e)))?;

        Ok(())
    }

    fn name(&self) -> &'static str {
        "jsonl"
    }
}

/// Writes leads to the log only.
pub struct LogLeadSink;

#[async_trait]
impl LeadSink for LogLeadSink {
    async fn persist(&self, lead: &LeadRecord) -> PipelineResult<()> {
        info!(
            lead_id = %lead.id,
            brand = %lead.brand_name,
            project_type = lead.project_type.as_str(),
            budget_tier = lead.budget_tier.as_str(),
            frame_count = lead.frame_count,
            "Lead captured"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
