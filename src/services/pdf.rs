//! PDF text extraction.
//!
//! The extraction library is synchronous, so the call runs on the blocking
//! pool and never stalls concurrent batch items.

use crate::error::AnalysisError;

#[derive(Clone, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    /// Extracts the full text of a PDF. Fails with a content error on
    /// corrupt input or when no text can be extracted (scanned documents).
    pub async fn extract_text(&self, pdf_bytes: Vec<u8>) -> Result<String, AnalysisError> {
        let text = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&pdf_bytes)
        })
        .await
        .map_err(|e| AnalysisError::Content(format!("Error al procesar PDF: {e}")))?
        .map_err(|e| {
            AnalysisError::Content(format!(
                "El archivo no es un PDF válido o está corrupto: {e}"
            ))
        })?;

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AnalysisError::Content(
                "El PDF no contiene texto extraíble (puede ser un PDF escaneado)".to_string(),
            ));
        }

        tracing::info!(chars = trimmed.len(), "PDF procesado");
        Ok(trimmed.to_string())
    }
}
