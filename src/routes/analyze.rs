//! Single-document analysis endpoint.

use axum::extract::{Multipart, Query, State};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::response::AnalysisEnvelope;
use crate::app::AppState;
use crate::config::ProviderKind;
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
pub struct AnalyzeParams {
    #[serde(default)]
    pub llm_provider: Option<String>,
}

/// POST /analyze-tdr
///
/// Receives one PDF as multipart and returns the validated structured
/// analysis wrapped with a success flag, timestamp and original filename.
pub async fn analyze_tdr(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AnalyzeParams>,
    multipart: Multipart,
) -> ApiResult<AnalysisEnvelope> {
    let provider = params
        .llm_provider
        .as_deref()
        .map(ProviderKind::parse)
        .transpose()
        .map_err(ApiError::from)?;

    let (filename, bytes) = read_file_field(multipart).await?;

    if !filename.ends_with(".pdf") {
        return Err(ApiError::BadRequest("El archivo debe ser un PDF".to_string()));
    }

    if bytes.len() > state.settings.max_file_size_bytes() {
        return Err(ApiError::PayloadTooLarge(format!(
            "El archivo excede el tamaño máximo permitido ({}MB)",
            state.settings.max_file_size_mb
        )));
    }

    let size_mb = bytes.len() as f64 / (1024.0 * 1024.0);
    tracing::info!(file = %filename, size_mb, "Recibido");

    let analysis = state.analyzer.analyze_document(bytes, provider).await?;

    tracing::info!(file = %filename, "Análisis completado exitosamente");
    Ok(AnalysisEnvelope::new(analysis, filename))
}

/// Pulls the uploaded document out of the multipart body.
async fn read_file_field(mut multipart: Multipart) -> ApiResult<(String, Vec<u8>)> {
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
            .map_err(|e| ApiError::BadRequest(format!("No se pudo leer el archivo: {e}")))?;
        return Ok((filename, bytes.to_vec()));
    }

    Err(ApiError::BadRequest(
        "La petición no contiene un archivo".to_string(),
    ))
}
