use anyhow::Result;
use std::env;

use crate::error::AnalysisError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }
}

/// Supported LLM vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    pub fn parse(s: &str) -> Result<Self, AnalysisError> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(AnalysisError::Configuration(format!(
                "Proveedor LLM no soportado: {other}"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub app_name: String,
    pub server_addr: String,

    // LLM providers
    pub default_provider: ProviderKind,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub anthropic_api_key: String,
    pub anthropic_model: String,

    // Retrieval
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k_chunks: usize,

    // Limits
    pub max_file_size_mb: usize,
    pub request_timeout_seconds: u64,

    // Batch processing
    pub max_concurrent_requests: usize,
    pub max_batch_files: usize,
    pub enable_batch_processing: bool,

    // CORS
    pub cors_allow_origins: Vec<String>,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let env_kind = Environment::from_str(&env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string()));
        let app_name =
            env::var("APP_NAME").unwrap_or_else(|_| "Analizador TDR SEACE".to_string());
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8001".to_string());

        let default_provider = env::var("DEFAULT_LLM_PROVIDER")
            .ok()
            .map(|s| ProviderKind::parse(&s))
            .transpose()
            .map_err(|e| anyhow::anyhow!("{e}"))?
            .unwrap_or(ProviderKind::Gemini);

        // Credentials may be absent at startup; the factory reports the
        // missing one only when its provider is actually selected.
        let gemini_api_key = env::var("GEMINI_API_KEY").unwrap_or_default();
        let gemini_model =
            env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());
        let openai_api_key = env::var("OPENAI_API_KEY").unwrap_or_default();
        let openai_model = env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let anthropic_api_key = env::var("ANTHROPIC_API_KEY").unwrap_or_default();
        let anthropic_model = env::var("ANTHROPIC_MODEL")
            .unwrap_or_else(|_| "claude-3-5-haiku-20250122".to_string());

        let chunk_size = env_or("CHUNK_SIZE", 1000);
        let chunk_overlap = env_or("CHUNK_OVERLAP", 200);
        let top_k_chunks = env_or("TOP_K_CHUNKS", 5);

        let max_file_size_mb = env_or("MAX_FILE_SIZE_MB", 10);
        let request_timeout_seconds = env_or("REQUEST_TIMEOUT_SECONDS", 60);

        let max_concurrent_requests = env_or("MAX_CONCURRENT_REQUESTS", 3);
        let max_batch_files = env_or("MAX_BATCH_FILES", 20);
        let enable_batch_processing = env_or("ENABLE_BATCH_PROCESSING", true);

        let cors_allow_origins = env::var("CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Settings {
            env: env_kind,
            app_name,
            server_addr,
            default_provider,
            gemini_api_key,
            gemini_model,
            openai_api_key,
            openai_model,
            anthropic_api_key,
            anthropic_model,
            chunk_size,
            chunk_overlap,
            top_k_chunks,
            max_file_size_mb,
            request_timeout_seconds,
            max_concurrent_requests,
            max_batch_files,
            enable_batch_processing,
            cors_allow_origins,
        })
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }

    /// Model identifier of the configured default provider.
    pub fn default_model(&self) -> &str {
        match self.default_provider {
            ProviderKind::Gemini => &self.gemini_model,
            ProviderKind::OpenAi => &self.openai_model,
            ProviderKind::Anthropic => &self.anthropic_model,
        }
    }
}

#[cfg(test)]
impl Default for Settings {
    fn default() -> Self {
        Self {
            env: Environment::Dev,
            app_name: "Analizador TDR SEACE".to_string(),
            server_addr: "127.0.0.1:8001".to_string(),
            default_provider: ProviderKind::Gemini,
            gemini_api_key: "test-key".to_string(),
            gemini_model: "gemini-2.5-flash".to_string(),
            openai_api_key: String::new(),
            openai_model: "gpt-4o-mini".to_string(),
            anthropic_api_key: String::new(),
            anthropic_model: "claude-3-5-haiku-20250122".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k_chunks: 5,
            max_file_size_mb: 10,
            request_timeout_seconds: 60,
            max_concurrent_requests: 3,
            max_batch_files: 20,
            enable_batch_processing: true,
            cors_allow_origins: vec!["*".to_string()],
        }
    }
}
