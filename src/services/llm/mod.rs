//! Interchangeable LLM backends.
//!
//! Every vendor adapter implements [`ProviderClient`]; the orchestrator only
//! sees the trait. Native document understanding is an optional capability:
//! adapters advertise it through `supports_document_input` and the default
//! `analyze_from_document` reports it as unavailable.

pub mod anthropic;
pub mod factory;
pub mod gemini;
pub mod openai;
pub mod parser;
pub mod prompts;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AnalysisError;

pub use anthropic::AnthropicClient;
pub use factory::ProviderFactory;
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

/// Contract implemented by every LLM vendor adapter.
///
/// Implementations are stateless beyond their fixed credential and model
/// name, so one instance is safe to reuse across concurrent requests.
#[async_trait]
pub trait ProviderClient: Send + Sync + std::fmt::Debug {
    fn provider_name(&self) -> &'static str;

    fn model(&self) -> &str;

    /// Runs the structured analysis over an assembled text context and
    /// returns the raw (unsanitized, unvalidated) response payload.
    async fn analyze_from_text(&self, context: &str) -> Result<Value, AnalysisError>;

    /// Whether this vendor accepts the raw PDF as a native document part.
    fn supports_document_input(&self) -> bool {
        false
    }

    /// Analyzes the raw PDF without any text extraction. Only meaningful
    /// when `supports_document_input` returns true.
    async fn analyze_from_document(
        &self,
        _pdf_bytes: &[u8],
        _filename: &str,
    ) -> Result<Value, AnalysisError> {
        Err(AnalysisError::Provider(format!(
            "El proveedor {} no soporta análisis directo de PDF",
            self.provider_name()
        )))
    }

    /// Scores a subscriber profile against a prior analysis and returns the
    /// raw response payload.
    async fn evaluate_compatibility(
        &self,
        company_copy: &str,
        tdr_analysis: &Value,
        contract_context: Option<&Value>,
        keywords: &[String],
    ) -> Result<Value, AnalysisError>;
}
