//! Batch analysis endpoints, sized for a scraper submitting a handful of
//! documents at a time.

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::api::response::BatchSummary;
use crate::app::AppState;
use crate::domain::batch::BatchItem;
use crate::error::{ApiError, ApiResult};

/// POST /batch/analyze-tdrs
///
/// Analyzes every uploaded PDF under the configured concurrency limit. A
/// failing document produces an error entry in its own slot; the rest of
/// the batch is unaffected.
pub async fn analyze_batch(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<BatchSummary> {
    if !state.settings.enable_batch_processing {
        return Err(ApiError::Forbidden(
            "El procesamiento por lotes está deshabilitado".to_string(),
        ));
    }

    let mut items = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart inválido: {e}")))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("No se pudo leer {filename}: {e}")))?;
        items.push(BatchItem {
            filename,
            bytes: bytes.to_vec(),
        });
    }

    if items.is_empty() {
        return Err(ApiError::BadRequest(
            "El lote no contiene archivos".to_string(),
        ));
    }

    let start = Instant::now();
    let outcomes = state
        .batch
        .run_batch(items, state.settings.max_concurrent_requests)
        .await?;
    let elapsed_seconds = start.elapsed().as_secs_f64();

    let summary = BatchSummary::new(outcomes, elapsed_seconds);
    tracing::info!(
        success = summary.success_count,
        errors = summary.error_count,
        elapsed_seconds,
        "Lote completado"
    );
    Ok(summary)
}

#[derive(Serialize)]
pub struct BatchStats {
    pub enabled: bool,
    pub max_concurrent_requests: usize,
    pub max_file_size_mb: usize,
    pub max_batch_files: usize,
    pub llm_provider: String,
    pub limits: serde_json::Value,
}

/// GET /batch/stats
///
/// Current limits plus static capacity-planning figures. Informational only.
pub async fn batch_stats(State(state): State<Arc<AppState>>) -> Json<BatchStats> {
    Json(BatchStats {
        enabled: state.settings.enable_batch_processing,
        max_concurrent_requests: state.settings.max_concurrent_requests,
        max_file_size_mb: state.settings.max_file_size_mb,
        max_batch_files: state.settings.max_batch_files,
        llm_provider: state.settings.default_provider.as_str().to_string(),
        limits: serde_json::json!({
            "gemini_free_tier": {
                "requests_per_day": 1500,
                "requests_per_minute": 15,
                "context_tokens": 1_000_000u64,
            },
            "estimated_daily_usage": {
                "rounds_per_day": 36,
                "docs_per_round_max": 10,
                "total_docs_per_day": 360,
                "percentage_of_free_tier": "24%",
            }
        }),
    })
}
