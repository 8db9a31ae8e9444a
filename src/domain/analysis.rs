//! Structured TDR analysis schema and its sanitization rules.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AnalysisError;

/// Character bounds enforced on the executive summary.
pub const MIN_SUMMARY_CHARS: usize = 50;
pub const MAX_SUMMARY_CHARS: usize = 1000;

/// Validated output of a single TDR analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TdrAnalysis {
    /// Executive summary, 2-3 paragraphs.
    #[serde(rename = "resumen_ejecutivo")]
    pub executive_summary: String,

    /// Specific technical requirements (technologies, experience,
    /// certifications). Empty when the document carries no clear information.
    #[serde(rename = "requisitos_tecnicos", default)]
    pub technical_requirements: Vec<String>,

    /// Business rules, contractual conditions and supplier obligations.
    #[serde(rename = "reglas_de_negocio", default)]
    pub business_rules: Vec<String>,

    /// Penalty clauses, fines and guarantees.
    #[serde(rename = "politicas_y_penalidades")]
    pub penalty_policies: Vec<String>,

    /// Reference budget as reported in the document ("S/ 120,000.00"), if any.
    #[serde(rename = "presupuesto_referencial", default)]
    pub reference_budget: Option<String>,

    /// Viability score assigned by the model; provider/version dependent.
    #[serde(
        rename = "score_compatibilidad",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub compatibility_score: Option<i64>,
}

impl TdrAnalysis {
    /// Deserializes a sanitized model payload and enforces the schema bounds.
    pub fn from_model_payload(payload: Value) -> Result<Self, AnalysisError> {
        let analysis: Self = serde_json::from_value(payload).map_err(|e| {
            AnalysisError::validation(field_from_serde_error(&e), e.to_string())
        })?;
        analysis.validate()?;
        Ok(analysis)
    }

    fn validate(&self) -> Result<(), AnalysisError> {
        let summary_chars = self.executive_summary.chars().count();
        if summary_chars < MIN_SUMMARY_CHARS {
            return Err(AnalysisError::validation(
                "resumen_ejecutivo",
                format!("debe tener al menos {MIN_SUMMARY_CHARS} caracteres (tiene {summary_chars})"),
            ));
        }
        if summary_chars > MAX_SUMMARY_CHARS {
            return Err(AnalysisError::validation(
                "resumen_ejecutivo",
                format!("excede el máximo de {MAX_SUMMARY_CHARS} caracteres"),
            ));
        }
        if let Some(score) = self.compatibility_score {
            if !(1..=10).contains(&score) {
                return Err(AnalysisError::validation(
                    "score_compatibilidad",
                    format!("debe estar entre 1 y 10 (es {score})"),
                ));
            }
        }
        Ok(())
    }
}

/// Trims the summary and hard-truncates it to the schema maximum.
///
/// Pure and idempotent; applied once before validation so over-long model
/// output is truncated instead of rejected.
pub fn sanitize_analysis_payload(mut payload: Value) -> Value {
    if let Some(obj) = payload.as_object_mut() {
        if let Some(summary) = obj.get("resumen_ejecutivo").and_then(Value::as_str) {
            let mut cleaned = summary.trim().to_string();
            if cleaned.chars().count() > MAX_SUMMARY_CHARS {
                tracing::warn!(
                    max = MAX_SUMMARY_CHARS,
                    "Resumen excede el límite; se truncará antes de validar"
                );
                cleaned = cleaned
                    .chars()
                    .take(MAX_SUMMARY_CHARS)
                    .collect::<String>()
                    .trim_end()
                    .to_string();
            }
            obj.insert("resumen_ejecutivo".to_string(), Value::String(cleaned));
        }
    }
    payload
}

/// Pulls the backtick-quoted field name out of a serde error message, so
/// schema violations name the offending field.
pub(crate) fn field_from_serde_error(err: &serde_json::Error) -> String {
    err.to_string()
        .split('`')
        .nth(1)
        .map(str::to_string)
        .unwrap_or_else(|| "respuesta".to_string())
}
