//! Recovery parser for model responses.
//!
//! Model output is nominally a bare JSON object but in practice arrives
//! wrapped in markdown fences, surrounded by prose, or truncated mid-value
//! when the model hits its output-token limit. This module absorbs all of
//! that: strategies are tried in order and the first one producing valid
//! JSON wins.

use serde_json::Value;
use thiserror::Error;

use crate::error::AnalysisError;

/// All recovery strategies failed. Carries a diagnostic snippet of the
/// cleaned response plus the strict parser's original complaint.
#[derive(Debug, Error)]
#[error("La respuesta del LLM no es un JSON válido: {source_message}\n\nRespuesta recibida (primeros 500 chars): {snippet}")]
pub struct ParseFailure {
    pub snippet: String,
    pub source_message: String,
}

impl From<ParseFailure> for AnalysisError {
    fn from(err: ParseFailure) -> Self {
        AnalysisError::validation("respuesta", err.to_string())
    }
}

/// Parses raw model text into a JSON value, repairing fenced, prose-wrapped
/// or truncated responses along the way.
pub fn parse_model_json(raw: &str) -> Result<Value, ParseFailure> {
    let cleaned = strip_code_fences(raw);

    let strict_err = match serde_json::from_str(&cleaned) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    // Truncation shows up as an unexpected-EOF class of error.
    if strict_err.is_eof() {
        if let Ok(value) = serde_json::from_str(&repair_truncation(&cleaned)) {
            return Ok(value);
        }
    }

    let candidates = object_candidates(&cleaned);
    for candidate in &candidates {
        if let Ok(value) = serde_json::from_str(candidate) {
            return Ok(value);
        }
    }
    for candidate in &candidates {
        if let Ok(value) = serde_json::from_str(&repair_truncation(candidate)) {
            return Ok(value);
        }
    }

    Err(ParseFailure {
        snippet: cleaned.chars().take(500).collect(),
        source_message: strict_err.to_string(),
    })
}

/// Removes a leading/trailing markdown fence and any language tags. The
/// trailing line is only dropped when it really is a fence: a truncated
/// response never closes its fence, and its last content line must survive.
fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let mut lines: Vec<&str> = trimmed.lines().collect();
    lines.remove(0);
    if lines
        .last()
        .map(|l| l.trim_start().starts_with("```"))
        .unwrap_or(false)
    {
        lines.pop();
    }
    lines
        .join("\n")
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Closes whatever a truncated response left open: an unterminated string
/// literal, a dangling comma, and unmatched brackets/braces. Brackets are
/// closed before braces, matching the typical object-of-arrays nesting of
/// the response schema.
fn repair_truncation(text: &str) -> String {
    let mut in_string = false;
    let mut escape = false;
    let mut open_braces: usize = 0;
    let mut open_brackets: usize = 0;

    for c in text.chars() {
        if escape {
            escape = false;
            continue;
        }
        match c {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '{' if !in_string => open_braces += 1,
            '}' if !in_string => open_braces = open_braces.saturating_sub(1),
            '[' if !in_string => open_brackets += 1,
            ']' if !in_string => open_brackets = open_brackets.saturating_sub(1),
            _ => {}
        }
    }

    let mut repaired = text.to_string();
    if escape {
        // Text ended on a lone backslash inside a string.
        repaired.pop();
    }
    if in_string {
        repaired.push('"');
    }
    let trimmed = repaired.trim_end();
    if let Some(stripped) = trimmed.strip_suffix(',') {
        repaired = stripped.to_string();
    }
    for _ in 0..open_brackets {
        repaired.push(']');
    }
    for _ in 0..open_braces {
        repaired.push('}');
    }
    repaired
}

/// Scans for balanced-brace object substrings, honoring string literals and
/// escapes. An unterminated trailing object is returned as a final candidate
/// so truncation repair gets a chance at it.
fn object_candidates(text: &str) -> Vec<String> {
    let mut candidates = Vec::new();
    let mut start: Option<usize> = None;
    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escape = false;

    for (i, c) in text.char_indices() {
        let Some(open) = start else {
            if c == '{' {
                start = Some(i);
                depth = 1;
                in_string = false;
                escape = false;
            }
            continue;
        };
        if escape {
            escape = false;
            continue;
        }
        match c {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    candidates.push(text[open..i + c.len_utf8()].to_string());
                    start = None;
                }
            }
            _ => {}
        }
    }

    if let Some(open) = start {
        candidates.push(text[open..].to_string());
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn plain_object_parses() {
        let value = parse_model_json(r#"{"score": 7, "nivel": "revisar"}"#).unwrap();
        assert_eq!(value, json!({"score": 7, "nivel": "revisar"}));
    }

    #[test]
    fn fenced_block_round_trips() {
        let original = json!({
            "resumen_ejecutivo": "Contratación de servicio de mantenimiento.",
            "requisitos_tecnicos": ["RNP vigente"],
            "politicas_y_penalidades": []
        });
        let wrapped = format!("```json\n{}\n```", serde_json::to_string_pretty(&original).unwrap());
        assert_eq!(parse_model_json(&wrapped).unwrap(), original);
    }

    #[test]
    fn fence_without_language_tag_round_trips() {
        let wrapped = "```\n{\"a\": [1, 2]}\n```";
        assert_eq!(parse_model_json(wrapped).unwrap(), json!({"a": [1, 2]}));
    }

    #[test]
    fn surrounding_prose_is_ignored() {
        let raw = "Claro, aquí está el análisis solicitado:\n{\"score\": 3.5}\nEspero que sea útil.";
        assert_eq!(parse_model_json(raw).unwrap(), json!({"score": 3.5}));
    }

    #[test]
    fn truncated_string_value_is_repaired() {
        let raw = r#"{"resumen_ejecutivo": "La entidad busca", "requisitos_tecnicos": ["ISO 9001", "experiencia de 3 añ"#;
        let value = parse_model_json(raw).unwrap();
        assert_eq!(value["resumen_ejecutivo"], json!("La entidad busca"));
        let reqs = value["requisitos_tecnicos"].as_array().unwrap();
        assert_eq!(reqs[0], json!("ISO 9001"));
        assert!(reqs[1].as_str().unwrap().starts_with("experiencia"));
    }

    #[test]
    fn truncation_preserves_fully_written_keys() {
        let raw = r#"{"a": {"b": [1, 2, 3], "c": "done"}, "d": [4, 5"#;
        let value = parse_model_json(raw).unwrap();
        assert_eq!(value["a"]["b"], json!([1, 2, 3]));
        assert_eq!(value["a"]["c"], json!("done"));
        assert_eq!(value["d"], json!([4, 5]));
    }

    #[test]
    fn dangling_comma_is_stripped() {
        let value = parse_model_json(r#"{"score": 6,"#).unwrap();
        assert_eq!(value, json!({"score": 6}));
    }

    #[test]
    fn escaped_quote_inside_truncated_string() {
        let value = parse_model_json(r#"{"explicacion": "dijo \"apto"#).unwrap();
        assert_eq!(value["explicacion"], json!("dijo \"apto"));
    }

    #[test]
    fn truncated_object_after_prose_is_repaired() {
        let raw = "Resultado del análisis:\n{\"factores_clave\": [\"rubro afín\", \"experiencia";
        let value = parse_model_json(raw).unwrap();
        let factors = value["factores_clave"].as_array().unwrap();
        assert_eq!(factors.len(), 2);
    }

    #[test]
    fn first_valid_candidate_wins() {
        let raw = "{not json} seguido de {\"valido\": true} y {\"otro\": 1}";
        assert_eq!(parse_model_json(raw).unwrap(), json!({"valido": true}));
    }

    #[test]
    fn unparseable_text_reports_snippet_and_cause() {
        let raw = "Lo siento, no puedo analizar este documento.";
        let err = parse_model_json(raw).unwrap_err();
        assert!(err.snippet.contains("Lo siento"));
        assert!(!err.source_message.is_empty());
        assert!(err.to_string().contains("primeros 500 chars"));
    }

    #[test]
    fn unclosed_fence_keeps_its_last_line() {
        let raw = "```json\n{\"requisitos_tecnicos\": [\"RNP vigente\",\n\"experiencia de 3 años";
        let value = parse_model_json(raw).unwrap();
        let reqs = value["requisitos_tecnicos"].as_array().unwrap();
        assert_eq!(reqs.len(), 2);
    }

    #[test]
    fn snippet_is_capped_at_500_chars() {
        let raw = "x".repeat(2000);
        let err = parse_model_json(&raw).unwrap_err();
        assert_eq!(err.snippet.chars().count(), 500);
    }
}
