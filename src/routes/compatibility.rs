//! Subscriber-profile compatibility endpoint.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::app::AppState;
use crate::domain::compatibility::{
    CompatibilityScore, CompatibilityScoreRequest, MAX_PROFILE_CHARS, MIN_PROFILE_CHARS,
};
use crate::error::{ApiError, ApiResult};

/// POST /compatibility-score
///
/// Scores how well the subscriber's business profile matches a previously
/// produced analysis.
pub async fn compatibility_score(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CompatibilityScoreRequest>,
) -> ApiResult<Json<CompatibilityScore>> {
    let profile_chars = request.company_copy.chars().count();
    if !(MIN_PROFILE_CHARS..=MAX_PROFILE_CHARS).contains(&profile_chars) {
        return Err(ApiError::BadRequest(format!(
            "company_copy debe tener entre {MIN_PROFILE_CHARS} y {MAX_PROFILE_CHARS} caracteres (tiene {profile_chars})"
        )));
    }

    let score = state.analyzer.evaluate_compatibility(&request).await?;

    tracing::info!(
        score = score.score,
        nivel = score.level.as_str(),
        "Compatibilidad evaluada"
    );
    Ok(Json(score))
}
