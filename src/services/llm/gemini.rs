//! Google Gemini adapter.
//!
//! The only backend with native document understanding: PDFs are shipped
//! inline as base64 parts, skipping text extraction entirely. JSON output
//! is requested through `responseMimeType`, so responses rarely need the
//! heavier repair strategies.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{parser, prompts, ProviderClient};
use crate::error::AnalysisError;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const TEMPERATURE: f64 = 0.2;
const MAX_OUTPUT_TOKENS: u32 = 8192;

#[derive(Debug)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    #[serde(rename = "systemInstruction")]
    system_instruction: ContentPayload<'a>,
    contents: Vec<ContentPayload<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct ContentPayload<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: &'static str,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "topP")]
    top_p: f64,
    #[serde(rename = "topK")]
    top_k: u32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(http: Client, api_key: &str, model: String) -> Result<Self, AnalysisError> {
        if api_key.is_empty() {
            return Err(AnalysisError::Configuration(
                "GEMINI_API_KEY no configurada en .env".to_string(),
            ));
        }
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            model,
        })
    }

    async fn generate(
        &self,
        system_prompt: &str,
        parts: Vec<Part<'_>>,
    ) -> Result<String, AnalysisError> {
        let url = format!("{API_BASE}/models/{}:generateContent", self.model);

        let body = GenerateRequest {
            system_instruction: ContentPayload {
                parts: vec![Part {
                    text: Some(system_prompt),
                    inline_data: None,
                }],
            },
            contents: vec![ContentPayload { parts }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                top_p: 0.95,
                top_k: 40,
                max_output_tokens: MAX_OUTPUT_TOKENS,
                response_mime_type: "application/json",
            },
        };

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalysisError::Provider(format!("Error en Gemini API: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Provider(format!(
                "Gemini API devolvió {status}: {}",
                detail.chars().take(300).collect::<String>()
            )));
        }

        let payload: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Provider(format!("Respuesta inválida de Gemini: {e}")))?;

        payload
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.text.filter(|t| !t.trim().is_empty()))
            .ok_or_else(|| {
                AnalysisError::Provider("Gemini no devolvió contenido de texto".to_string())
            })
    }
}

#[async_trait]
impl ProviderClient for GeminiClient {
    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn analyze_from_text(&self, context: &str) -> Result<Value, AnalysisError> {
        tracing::info!(model = %self.model, chars = context.len(), "Analizando TDR con Gemini");

        let prompt = prompts::analysis_user_prompt(context);
        let raw = self
            .generate(
                prompts::SYSTEM_PROMPT,
                vec![Part {
                    text: Some(&prompt),
                    inline_data: None,
                }],
            )
            .await?;

        tracing::debug!(preview = %raw.chars().take(500).collect::<String>(), "Respuesta de Gemini");
        Ok(parser::parse_model_json(&raw)?)
    }

    fn supports_document_input(&self) -> bool {
        true
    }

    async fn analyze_from_document(
        &self,
        pdf_bytes: &[u8],
        filename: &str,
    ) -> Result<Value, AnalysisError> {
        tracing::info!(
            model = %self.model,
            file = filename,
            bytes = pdf_bytes.len(),
            "Analizando PDF directo con Gemini"
        );

        let parts = vec![
            Part {
                text: Some(prompts::DOCUMENT_ANALYSIS_PROMPT),
                inline_data: None,
            },
            Part {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: "application/pdf",
                    data: BASE64.encode(pdf_bytes),
                }),
            },
        ];

        let raw = self.generate(prompts::SYSTEM_PROMPT, parts).await?;
        Ok(parser::parse_model_json(&raw)?)
    }

    async fn evaluate_compatibility(
        &self,
        company_copy: &str,
        tdr_analysis: &Value,
        contract_context: Option<&Value>,
        keywords: &[String],
    ) -> Result<Value, AnalysisError> {
        tracing::info!(model = %self.model, "Evaluando compatibilidad con Gemini");

        let prompt =
            prompts::compatibility_prompt(company_copy, tdr_analysis, contract_context, keywords);
        let raw = self
            .generate(
                prompts::COMPATIBILITY_SYSTEM_PROMPT,
                vec![Part {
                    text: Some(&prompt),
                    inline_data: None,
                }],
            )
            .await?;

        Ok(parser::parse_model_json(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_is_a_configuration_error() {
        let err = GeminiClient::new(Client::new(), "", "gemini-2.5-flash".to_string()).unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration(_)));
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn advertises_document_capability() {
        let client =
            GeminiClient::new(Client::new(), "key", "gemini-2.5-flash".to_string()).unwrap();
        assert!(client.supports_document_input());
        assert_eq!(client.provider_name(), "gemini");
    }
}
