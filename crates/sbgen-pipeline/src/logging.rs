//! Structured run logging.

use tracing::{error, info, warn, Span};

use sbgen_models::RunId;

/// Logs run lifecycle events with the run ID attached.
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    operation: String,
}

impl RunLogger {
    pub fn new(run_id: &RunId, operation: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(run_id = %self.run_id, operation = %self.operation, "Run started: {}", message);
    }

    pub fn log_progress(&self, message: &str) {
        info!(run_id = %self.run_id, operation = %self.operation, "Run progress: {}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(run_id = %self.run_id, operation = %self.operation, "Run warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(run_id = %self.run_id, operation = %self.operation, "Run error: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(run_id = %self.run_id, operation = %self.operation, "Run completed: {}", message);
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Span covering the whole run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("run", run_id = %self.run_id, operation = %self.operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_logger_creation() {
        let run_id = RunId::new();
        let logger = RunLogger::new(&run_id, "storyboard");
        assert_eq!(logger.run_id(), run_id.as_str());
    }
}
