//! Storyboard generation handler.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::sse::{Event, Sse};
use axum::Json;
use futures_util::stream::Stream;
use tracing::info;

use sbgen_models::{BriefPayload, OutputLanguage};
use sbgen_pipeline::ChannelSink;

use crate::error::ApiResult;
use crate::sse::StreamingProgressChannel;
use crate::state::AppState;

/// Locale to use when the brief does not name an output language.
///
/// `X-Locale` wins over `Accept-Language`; English when neither resolves.
pub fn resolve_locale(headers: &HeaderMap) -> OutputLanguage {
    header_str(headers, "x-locale")
        .and_then(OutputLanguage::from_locale)
        .or_else(|| {
            header_str(headers, header::ACCEPT_LANGUAGE.as_str())
                .and_then(OutputLanguage::from_accept_language)
        })
        .unwrap_or(OutputLanguage::En)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Start a storyboard run and stream its progress.
///
/// A body that is not JSON is rejected with 400. A JSON brief with missing
/// fields still opens the stream, which then carries a single `error` event.
pub async fn generate_storyboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<BriefPayload>, JsonRejection>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let Json(payload) = payload?;
    let fallback_language = resolve_locale(&headers);

    info!(
        project_type = payload.project_type.as_deref().unwrap_or("-"),
        locale = fallback_language.as_str(),
        "Storyboard generation requested"
    );

    let (sink, rx) = ChannelSink::new();
    // Detached; the run outlives a disconnected client so the lead is still captured.
    state
        .orchestrator
        .spawn_run(payload, fallback_language, Arc::new(sink));

    Ok(StreamingProgressChannel::new(rx).into_sse())
}
