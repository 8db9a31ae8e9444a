//! Anthropic Claude adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{parser, prompts, ProviderClient};
use crate::error::AnalysisError;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const TEMPERATURE: f64 = 0.2;
const MAX_TOKENS: u32 = 2048;

#[derive(Debug)]
pub struct AnthropicClient {
    http: Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

impl AnthropicClient {
    pub fn new(http: Client, api_key: &str, model: String) -> Result<Self, AnalysisError> {
        if api_key.is_empty() {
            return Err(AnalysisError::Configuration(
                "ANTHROPIC_API_KEY no configurada en .env".to_string(),
            ));
        }
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            model,
        })
    }

    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AnalysisError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            system: system_prompt,
            messages: vec![Message {
                role: "user",
                content: user_prompt,
            }],
        };

        let response = self
            .http
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalysisError::Provider(format!("Error en Anthropic API: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Provider(format!(
                "Anthropic API devolvió {status}: {}",
                detail.chars().take(300).collect::<String>()
            )));
        }

        let payload: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Provider(format!("Respuesta inválida de Anthropic: {e}")))?;

        payload
            .content
            .into_iter()
            .find_map(|block| block.text.filter(|t| !t.trim().is_empty()))
            .ok_or_else(|| {
                AnalysisError::Provider("Anthropic no devolvió contenido de texto".to_string())
            })
    }
}

#[async_trait]
impl ProviderClient for AnthropicClient {
    fn provider_name(&self) -> &'static str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn analyze_from_text(&self, context: &str) -> Result<Value, AnalysisError> {
        tracing::info!(model = %self.model, chars = context.len(), "Analizando TDR con Anthropic");

        let prompt = prompts::analysis_user_prompt(context);
        let raw = self.generate(prompts::SYSTEM_PROMPT, &prompt).await?;

        tracing::debug!(preview = %raw.chars().take(500).collect::<String>(), "Respuesta de Claude");
        Ok(parser::parse_model_json(&raw)?)
    }

    async fn evaluate_compatibility(
        &self,
        company_copy: &str,
        tdr_analysis: &Value,
        contract_context: Option<&Value>,
        keywords: &[String],
    ) -> Result<Value, AnalysisError> {
        tracing::info!(model = %self.model, "Evaluando compatibilidad con Anthropic");

        let prompt =
            prompts::compatibility_prompt(company_copy, tdr_analysis, contract_context, keywords);
        let raw = self
            .generate(prompts::COMPATIBILITY_SYSTEM_PROMPT, &prompt)
            .await?;

        Ok(parser::parse_model_json(&raw)?)
    }
}
