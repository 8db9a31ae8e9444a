//! Selects and builds the vendor adapter for a requested provider.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

use super::{AnthropicClient, GeminiClient, OpenAiClient, ProviderClient};
use crate::config::{ProviderKind, Settings};
use crate::error::AnalysisError;

/// Builds provider clients from the immutable settings. All clients share
/// one HTTP client carrying the configured request timeout.
#[derive(Clone)]
pub struct ProviderFactory {
    settings: Settings,
    http: Client,
}

impl ProviderFactory {
    pub fn new(settings: Settings) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { settings, http })
    }

    /// Builds the client for `provider`, or for the configured default when
    /// `None`. Fails with a configuration error naming the missing
    /// credential when the selected provider's key is unset.
    pub fn create(
        &self,
        provider: Option<ProviderKind>,
    ) -> Result<Arc<dyn ProviderClient>, AnalysisError> {
        let provider = provider.unwrap_or(self.settings.default_provider);
        tracing::info!(provider = provider.as_str(), "Creando cliente LLM");

        match provider {
            ProviderKind::Gemini => Ok(Arc::new(GeminiClient::new(
                self.http.clone(),
                &self.settings.gemini_api_key,
                self.settings.gemini_model.clone(),
            )?)),
            ProviderKind::OpenAi => Ok(Arc::new(OpenAiClient::new(
                self.http.clone(),
                &self.settings.openai_api_key,
                self.settings.openai_model.clone(),
            )?)),
            ProviderKind::Anthropic => Ok(Arc::new(AnthropicClient::new(
                self.http.clone(),
                &self.settings.anthropic_api_key,
                self.settings.anthropic_model.clone(),
            )?)),
        }
    }
}
