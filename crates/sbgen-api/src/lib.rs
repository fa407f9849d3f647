//! Axum HTTP API server for storyboard generation.
//!
//! This crate provides:
//! - A streaming generation endpoint that reports run progress as SSE
//! - A synchronous storyboard translation endpoint
//! - Rate limiting, CORS and security headers
//! - Prometheus metrics and health probes

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod sse;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use sse::StreamingProgressChannel;
pub use state::{AppState, ProviderStatus};
