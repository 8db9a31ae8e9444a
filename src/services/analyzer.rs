//! End-to-end pipeline for a single document.
//!
//! Extract text (or hand the raw PDF to a provider with native document
//! understanding), assemble a bounded context, invoke the provider, then
//! sanitize and validate the structured response.

use serde_json::Value;

use crate::config::{ProviderKind, Settings};
use crate::domain::analysis::{sanitize_analysis_payload, TdrAnalysis};
use crate::domain::compatibility::{
    sanitize_compatibility_payload, CompatibilityScore, CompatibilityScoreRequest,
};
use crate::error::AnalysisError;
use crate::services::context;
use crate::services::llm::{ProviderClient, ProviderFactory};
use crate::services::pdf::PdfExtractor;
use crate::services::retrieval::FragmentRetriever;

/// Extracted text below this many characters is treated as "not enough to
/// analyze" (typically a scanned, image-only document).
pub const MIN_VIABLE_TEXT_CHARS: usize = 100;

/// Documents below this many characters skip retrieval and are sent whole.
pub const RETRIEVAL_BYPASS_CHARS: usize = 5000;

pub struct AnalyzerService {
    factory: ProviderFactory,
    pdf: PdfExtractor,
    retriever: FragmentRetriever,
}

impl AnalyzerService {
    pub fn new(settings: &Settings, factory: ProviderFactory) -> Result<Self, AnalysisError> {
        let retriever = FragmentRetriever::new(
            settings.chunk_size,
            settings.chunk_overlap,
            settings.top_k_chunks,
        )?;
        Ok(Self {
            factory,
            pdf: PdfExtractor,
            retriever,
        })
    }

    /// Full analysis pipeline for one PDF.
    pub async fn analyze_document(
        &self,
        pdf_bytes: Vec<u8>,
        provider: Option<ProviderKind>,
    ) -> Result<TdrAnalysis, AnalysisError> {
        let client = self.factory.create(provider)?;
        self.analyze_with_client(client.as_ref(), pdf_bytes).await
    }

    pub(crate) async fn analyze_with_client(
        &self,
        client: &dyn ProviderClient,
        pdf_bytes: Vec<u8>,
    ) -> Result<TdrAnalysis, AnalysisError> {
        if client.supports_document_input() {
            tracing::info!(
                provider = client.provider_name(),
                "Cliente LLM soporta PDF directo, omitiendo extracción de texto"
            );
            let raw = client.analyze_from_document(&pdf_bytes, "tdr.pdf").await?;
            return Self::finish(raw);
        }

        tracing::info!(
            provider = client.provider_name(),
            "Cliente LLM no soporta PDF directo, extrayendo texto"
        );
        let full_text = self.pdf.extract_text(pdf_bytes).await?;
        self.analyze_text(client, &full_text).await
    }

    pub(crate) async fn analyze_text(
        &self,
        client: &dyn ProviderClient,
        full_text: &str,
    ) -> Result<TdrAnalysis, AnalysisError> {
        if full_text.chars().count() < MIN_VIABLE_TEXT_CHARS {
            return Err(AnalysisError::Content(
                "El PDF contiene muy poco texto para analizar".to_string(),
            ));
        }

        let context = self.build_context(full_text);
        let raw = client.analyze_from_text(&context).await?;
        Self::finish(raw)
    }

    /// Retrieval is skipped for short documents so no content is discarded.
    pub(crate) fn build_context(&self, full_text: &str) -> String {
        if full_text.chars().count() < RETRIEVAL_BYPASS_CHARS {
            tracing::info!("Documento pequeño detectado, enviando texto completo al LLM");
            return context::full_document_context(full_text);
        }

        let chunks = self.retriever.chunk(full_text);
        tracing::info!(chunks = chunks.len(), "Documento dividido en chunks");
        let fragments = self.retriever.select(&chunks);
        context::assemble(&fragments)
    }

    fn finish(raw: Value) -> Result<TdrAnalysis, AnalysisError> {
        let sanitized = sanitize_analysis_payload(raw);
        TdrAnalysis::from_model_payload(sanitized)
    }

    /// Scores a subscriber profile against an existing analysis.
    pub async fn evaluate_compatibility(
        &self,
        request: &CompatibilityScoreRequest,
    ) -> Result<CompatibilityScore, AnalysisError> {
        if request.company_copy.trim().is_empty() {
            return Err(AnalysisError::Content(
                "El copy del suscriptor es obligatorio para evaluar compatibilidad".to_string(),
            ));
        }

        let provider = request
            .llm_provider
            .as_deref()
            .map(ProviderKind::parse)
            .transpose()?;
        let client = self.factory.create(provider)?;
        self.evaluate_with_client(client.as_ref(), request).await
    }

    pub(crate) async fn evaluate_with_client(
        &self,
        client: &dyn ProviderClient,
        request: &CompatibilityScoreRequest,
    ) -> Result<CompatibilityScore, AnalysisError> {
        let raw = client
            .evaluate_compatibility(
                &request.company_copy,
                &request.tdr_analysis,
                request.contract_context.as_ref(),
                &request.keywords,
            )
            .await?;

        let sanitized = sanitize_compatibility_payload(raw);
        CompatibilityScore::from_model_payload(sanitized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug)]
    struct StubClient {
        payload: Value,
        supports_document: bool,
        calls: AtomicUsize,
        last_context: Mutex<Option<String>>,
    }

    impl StubClient {
        fn new(payload: Value) -> Self {
            Self {
                payload,
                supports_document: false,
                calls: AtomicUsize::new(0),
                last_context: Mutex::new(None),
            }
        }

        fn with_document_support(mut self) -> Self {
            self.supports_document = true;
            self
        }
    }

    #[async_trait]
    impl ProviderClient for StubClient {
        fn provider_name(&self) -> &'static str {
            "stub"
        }

        fn model(&self) -> &str {
            "stub-model"
        }

        async fn analyze_from_text(&self, context: &str) -> Result<Value, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_context.lock().unwrap() = Some(context.to_string());
            Ok(self.payload.clone())
        }

        fn supports_document_input(&self) -> bool {
            self.supports_document
        }

        async fn analyze_from_document(
            &self,
            _pdf_bytes: &[u8],
            _filename: &str,
        ) -> Result<Value, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.payload.clone())
        }

        async fn evaluate_compatibility(
            &self,
            _company_copy: &str,
            _tdr_analysis: &Value,
            _contract_context: Option<&Value>,
            _keywords: &[String],
        ) -> Result<Value, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.payload.clone())
        }
    }

    fn analyzer() -> AnalyzerService {
        let settings = Settings::default();
        let factory = ProviderFactory::new(settings.clone()).unwrap();
        AnalyzerService::new(&settings, factory).unwrap()
    }

    fn analysis_payload() -> Value {
        json!({
            "resumen_ejecutivo": "La entidad requiere un servicio de mantenimiento integral de equipos de cómputo por doce meses.",
            "requisitos_tecnicos": ["Técnicos certificados"],
            "reglas_de_negocio": ["Atención en sede del cliente"],
            "politicas_y_penalidades": ["Penalidad del 10% por retraso"],
            "presupuesto_referencial": null,
            "score_compatibilidad": 8
        })
    }

    #[tokio::test]
    async fn document_capable_client_skips_text_extraction() {
        // The bytes are not a valid PDF; the native path must never touch them.
        let client = StubClient::new(analysis_payload()).with_document_support();
        let analysis = analyzer()
            .analyze_with_client(&client, b"raw bytes".to_vec())
            .await
            .unwrap();
        assert_eq!(analysis.compatibility_score, Some(8));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn short_text_is_a_content_error() {
        let client = StubClient::new(analysis_payload());
        let err = analyzer()
            .analyze_text(&client, "texto corto")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Content(_)));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn short_document_bypasses_retrieval() {
        let client = StubClient::new(analysis_payload());
        let full_text = "penalidades y requisitos ".repeat(20);
        analyzer().analyze_text(&client, &full_text).await.unwrap();

        let context = client.last_context.lock().unwrap().clone().unwrap();
        assert_eq!(context, context::full_document_context(&full_text));
    }

    #[test]
    fn long_document_goes_through_retrieval() {
        let long_text = "especificaciones técnicas del servicio ".repeat(300);
        let context = analyzer().build_context(&long_text);
        assert!(context.starts_with("=== CONTEXTO EXTRAÍDO DEL TDR ==="));
        assert!(context.contains("## REQUISITOS:"));
    }

    #[tokio::test]
    async fn over_long_summary_is_truncated_not_rejected() {
        let mut payload = analysis_payload();
        payload["resumen_ejecutivo"] = json!("detalle ".repeat(400));
        let client = StubClient::new(payload).with_document_support();

        let analysis = analyzer()
            .analyze_with_client(&client, b"pdf".to_vec())
            .await
            .unwrap();
        assert!(analysis.executive_summary.chars().count() <= 1000);
    }

    #[tokio::test]
    async fn invalid_payload_is_a_validation_error() {
        let client = StubClient::new(json!({"resumen_ejecutivo": "ok"})).with_document_support();
        let err = analyzer()
            .analyze_with_client(&client, b"pdf".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Validation { .. }));
    }

    #[tokio::test]
    async fn blank_profile_is_rejected_before_calling_the_provider() {
        let request = CompatibilityScoreRequest {
            company_copy: "   ".to_string(),
            tdr_analysis: json!({}),
            contract_context: None,
            keywords: vec![],
            llm_provider: None,
        };
        let err = analyzer().evaluate_compatibility(&request).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Content(_)));
    }

    #[tokio::test]
    async fn compatibility_payload_is_sanitized_and_validated() {
        let client = StubClient::new(json!({
            "score": "9.5",
            "nivel": "quizás",
            "factores_clave": "no es lista"
        }));
        let request = CompatibilityScoreRequest {
            company_copy: "Empresa de mantenimiento con flota propia".to_string(),
            tdr_analysis: json!({"resumen_ejecutivo": "Servicio de mantenimiento"}),
            contract_context: None,
            keywords: vec!["mantenimiento".to_string()],
            llm_provider: None,
        };

        let score = analyzer()
            .evaluate_with_client(&client, &request)
            .await
            .unwrap();
        assert_eq!(score.score, 9.5);
        assert_eq!(score.level, crate::domain::CompatibilityLevel::Fit);
        assert!(score.key_factors.is_empty());
        assert!(!score.explanation.is_empty());
    }
}
