//! Subscriber-profile compatibility schema and its sanitization rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::analysis::field_from_serde_error;
use crate::error::AnalysisError;

/// Placeholder substituted when the model omits the explanation.
pub const MISSING_EXPLANATION: &str = "Sin explicación proporcionada por el modelo.";

pub const MIN_EXPLANATION_CHARS: usize = 20;
pub const MAX_EXPLANATION_CHARS: usize = 1000;

pub const MIN_PROFILE_CHARS: usize = 20;
pub const MAX_PROFILE_CHARS: usize = 4000;

/// Qualitative compatibility classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompatibilityLevel {
    #[serde(rename = "apto")]
    Fit,
    #[serde(rename = "revisar")]
    Review,
    #[serde(rename = "descartar")]
    Reject,
}

impl CompatibilityLevel {
    /// Deterministic derivation used when the model omits or mis-states the level.
    pub fn from_score(score: f64) -> Self {
        if score >= 8.0 {
            Self::Fit
        } else if score >= 5.0 {
            Self::Review
        } else {
            Self::Reject
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fit => "apto",
            Self::Review => "revisar",
            Self::Reject => "descartar",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "apto" => Some(Self::Fit),
            "revisar" => Some(Self::Review),
            "descartar" => Some(Self::Reject),
            _ => None,
        }
    }
}

/// Validated compatibility evaluation for one subscriber profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityScore {
    /// Decimal score in [0, 10].
    pub score: f64,

    #[serde(rename = "nivel")]
    pub level: CompatibilityLevel,

    /// Summarized reason behind the score.
    #[serde(rename = "explicacion")]
    pub explanation: String,

    /// Elements of the document favoring compatibility.
    #[serde(rename = "factores_clave", default)]
    pub key_factors: Vec<String>,

    /// Alerts or restrictions detected.
    #[serde(rename = "riesgos", default)]
    pub risks: Vec<String>,

    pub timestamp: DateTime<Utc>,
}

impl CompatibilityScore {
    /// Deserializes a sanitized model payload and enforces the schema bounds.
    pub fn from_model_payload(payload: Value) -> Result<Self, AnalysisError> {
        let score: Self = serde_json::from_value(payload).map_err(|e| {
            AnalysisError::validation(field_from_serde_error(&e), e.to_string())
        })?;
        score.validate()?;
        Ok(score)
    }

    fn validate(&self) -> Result<(), AnalysisError> {
        if !(0.0..=10.0).contains(&self.score) {
            return Err(AnalysisError::validation(
                "score",
                format!("debe estar entre 0 y 10 (es {})", self.score),
            ));
        }
        let chars = self.explanation.chars().count();
        if !(MIN_EXPLANATION_CHARS..=MAX_EXPLANATION_CHARS).contains(&chars) {
            return Err(AnalysisError::validation(
                "explicacion",
                format!(
                    "debe tener entre {MIN_EXPLANATION_CHARS} y {MAX_EXPLANATION_CHARS} caracteres (tiene {chars})"
                ),
            ));
        }
        Ok(())
    }
}

/// Applies the default/clamp rules to a raw compatibility payload.
///
/// Pure and idempotent: score coerced and clamped to [0, 10], level derived
/// from the score when invalid, list fields coerced to arrays, explanation
/// and timestamp defaulted when missing.
pub fn sanitize_compatibility_payload(payload: Value) -> Value {
    let mut obj = match payload {
        Value::Object(obj) => obj,
        _ => serde_json::Map::new(),
    };

    let score = coerce_score(obj.get("score"));
    obj.insert("score".to_string(), serde_json::json!(score));

    let level = obj
        .get("nivel")
        .and_then(Value::as_str)
        .map(str::to_lowercase)
        .as_deref()
        .and_then(CompatibilityLevel::parse)
        .unwrap_or_else(|| CompatibilityLevel::from_score(score));
    obj.insert("nivel".to_string(), Value::String(level.as_str().to_string()));

    for key in ["factores_clave", "riesgos"] {
        if !obj.get(key).map(Value::is_array).unwrap_or(false) {
            obj.insert(key.to_string(), Value::Array(Vec::new()));
        }
    }

    let explanation_missing = obj
        .get("explicacion")
        .and_then(Value::as_str)
        .map(str::is_empty)
        .unwrap_or(true);
    if explanation_missing {
        obj.insert(
            "explicacion".to_string(),
            Value::String(MISSING_EXPLANATION.to_string()),
        );
    }

    let timestamp_missing = obj
        .get("timestamp")
        .and_then(Value::as_str)
        .map(str::is_empty)
        .unwrap_or(true);
    if timestamp_missing {
        obj.insert(
            "timestamp".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
    }

    Value::Object(obj)
}

fn coerce_score(raw: Option<&Value>) -> f64 {
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.unwrap_or(0.0).clamp(0.0, 10.0)
}

/// Request body for a compatibility evaluation.
#[derive(Debug, Clone, Deserialize)]
pub struct CompatibilityScoreRequest {
    /// Description of the subscriber's line of business and strengths.
    pub company_copy: String,

    /// Previously generated structured analysis for the document.
    #[serde(rename = "analisis_tdr")]
    pub tdr_analysis: Value,

    /// Contract metadata (entity, object, dates).
    #[serde(rename = "contrato_contexto", default)]
    pub contract_context: Option<Value>,

    /// Subscribed keywords enriching the context.
    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub llm_provider: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn level_derivation_boundaries() {
        assert_eq!(CompatibilityLevel::from_score(8.0), CompatibilityLevel::Fit);
        assert_eq!(CompatibilityLevel::from_score(7.9), CompatibilityLevel::Review);
        assert_eq!(CompatibilityLevel::from_score(5.0), CompatibilityLevel::Review);
        assert_eq!(CompatibilityLevel::from_score(4.9), CompatibilityLevel::Reject);
    }

    #[test]
    fn out_of_range_score_is_clamped_before_level_derivation() {
        let sanitized = sanitize_compatibility_payload(json!({ "score": 14.2 }));
        assert_eq!(sanitized["score"], json!(10.0));
        assert_eq!(sanitized["nivel"], json!("apto"));

        let sanitized = sanitize_compatibility_payload(json!({ "score": -3 }));
        assert_eq!(sanitized["score"], json!(0.0));
        assert_eq!(sanitized["nivel"], json!("descartar"));
    }

    #[test]
    fn non_numeric_score_defaults_to_zero() {
        let sanitized = sanitize_compatibility_payload(json!({ "score": "no aplica" }));
        assert_eq!(sanitized["score"], json!(0.0));

        let sanitized = sanitize_compatibility_payload(json!({ "score": "7.5" }));
        assert_eq!(sanitized["score"], json!(7.5));
    }

    #[test]
    fn invalid_level_is_rederived_but_valid_level_is_kept() {
        let sanitized = sanitize_compatibility_payload(json!({ "score": 9.0, "nivel": "tal vez" }));
        assert_eq!(sanitized["nivel"], json!("apto"));

        // A stated valid level wins over derivation.
        let sanitized = sanitize_compatibility_payload(json!({ "score": 2.0, "nivel": "APTO" }));
        assert_eq!(sanitized["nivel"], json!("apto"));
    }

    #[test]
    fn missing_fields_get_defaults() {
        let sanitized = sanitize_compatibility_payload(json!({ "score": 6 }));
        assert_eq!(sanitized["factores_clave"], json!([]));
        assert_eq!(sanitized["riesgos"], json!([]));
        assert_eq!(sanitized["explicacion"], json!(MISSING_EXPLANATION));
        assert!(sanitized["timestamp"].as_str().is_some());
    }

    #[test]
    fn non_list_fields_are_coerced() {
        let sanitized = sanitize_compatibility_payload(json!({
            "score": 6,
            "factores_clave": "experiencia en rubro",
            "riesgos": null
        }));
        assert_eq!(sanitized["factores_clave"], json!([]));
        assert_eq!(sanitized["riesgos"], json!([]));
    }

    #[test]
    fn sanitized_payload_passes_validation() {
        let sanitized = sanitize_compatibility_payload(json!({
            "score": 7.2,
            "explicacion": "El rubro del suscriptor coincide con el objeto del contrato.",
            "factores_clave": ["rubro afín"],
            "riesgos": []
        }));
        let score = CompatibilityScore::from_model_payload(sanitized).unwrap();
        assert_eq!(score.level, CompatibilityLevel::Review);
        assert_eq!(score.key_factors, vec!["rubro afín".to_string()]);
    }

    #[test]
    fn short_explanation_is_rejected() {
        let sanitized = sanitize_compatibility_payload(json!({
            "score": 7.2,
            "explicacion": "corta"
        }));
        let err = CompatibilityScore::from_model_payload(sanitized).unwrap_err();
        assert!(err.to_string().contains("explicacion"));
    }
}
