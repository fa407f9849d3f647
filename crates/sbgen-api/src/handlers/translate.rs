//! Storyboard translation handler.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use sbgen_models::{GeneratedStoryboard, OutputLanguage};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Translation request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    pub storyboard: GeneratedStoryboard,
    pub target_language: String,
}

/// Translate a finished storyboard into another language.
///
/// Fields that fail to translate come back unchanged, including when no
/// text provider is configured.
pub async fn translate_storyboard(
    State(state): State<AppState>,
    request: Result<Json<TranslateRequest>, JsonRejection>,
) -> ApiResult<Json<GeneratedStoryboard>> {
    let Json(request) = request?;

    let target = OutputLanguage::from_locale(&request.target_language)
        .ok_or_else(|| ApiError::validation("targetLanguage must not be empty"))?;

    info!(
        target = target.as_str(),
        frames = request.storyboard.frame_count(),
        "Translating storyboard"
    );
    metrics::record_translation(target.as_str());

    let translated = state
        .translator
        .translate_storyboard(&request.storyboard, target)
        .await;

    Ok(Json(translated))
}
