//! OpenAI adapter.
//!
//! Uses the chat-completions endpoint with `response_format: json_object`
//! so the model is forced into JSON mode.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{parser, prompts, ProviderClient};
use crate::error::AnalysisError;

const API_URL: &str = "https://api.openai.com/v1/chat/completions";
const TEMPERATURE: f64 = 0.2;
const MAX_TOKENS: u32 = 2048;

#[derive(Debug)]
pub struct OpenAiClient {
    http: Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(http: Client, api_key: &str, model: String) -> Result<Self, AnalysisError> {
        if api_key.is_empty() {
            return Err(AnalysisError::Configuration(
                "OPENAI_API_KEY no configurada en .env".to_string(),
            ));
        }
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            model,
        })
    }

    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AnalysisError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .http
            .post(API_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalysisError::Provider(format!("Error en OpenAI API: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Provider(format!(
                "OpenAI API devolvió {status}: {}",
                detail.chars().take(300).collect::<String>()
            )));
        }

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Provider(format!("Respuesta inválida de OpenAI: {e}")))?;

        payload
            .choices
            .into_iter()
            .find_map(|c| c.message.content.filter(|t| !t.trim().is_empty()))
            .ok_or_else(|| {
                AnalysisError::Provider("OpenAI no devolvió contenido de texto".to_string())
            })
    }
}

#[async_trait]
impl ProviderClient for OpenAiClient {
    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn analyze_from_text(&self, context: &str) -> Result<Value, AnalysisError> {
        tracing::info!(model = %self.model, chars = context.len(), "Analizando TDR con OpenAI");

        let prompt = prompts::analysis_user_prompt(context);
        let raw = self.generate(prompts::SYSTEM_PROMPT, &prompt).await?;

        tracing::debug!(preview = %raw.chars().take(500).collect::<String>(), "Respuesta de OpenAI");
        Ok(parser::parse_model_json(&raw)?)
    }

    async fn evaluate_compatibility(
        &self,
        company_copy: &str,
        tdr_analysis: &Value,
        contract_context: Option<&Value>,
        keywords: &[String],
    ) -> Result<Value, AnalysisError> {
        tracing::info!(model = %self.model, "Evaluando compatibilidad con OpenAI");

        let prompt =
            prompts::compatibility_prompt(company_copy, tdr_analysis, contract_context, keywords);
        let raw = self
            .generate(prompts::COMPATIBILITY_SYSTEM_PROMPT, &prompt)
            .await?;

        Ok(parser::parse_model_json(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_is_a_configuration_error() {
        let err = OpenAiClient::new(Client::new(), "", "gpt-4o-mini".to_string()).unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration(_)));
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn does_not_advertise_document_capability() {
        let client = OpenAiClient::new(Client::new(), "key", "gpt-4o-mini".to_string()).unwrap();
        assert!(!client.supports_document_input());
    }
}
