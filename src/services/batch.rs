//! Bounded-concurrency batch processing.
//!
//! Fans a list of documents out to the analysis pipeline under a semaphore.
//! One slow or failing document degrades that document's outcome only:
//! every per-item error, including a panic inside the pipeline, is captured
//! as an error outcome and never cancels sibling items. Outcomes are
//! collected by input index, so result order always matches input order.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::config::Settings;
use crate::domain::analysis::TdrAnalysis;
use crate::domain::batch::{BatchItem, BatchOutcome};
use crate::error::AnalysisError;
use crate::services::analyzer::AnalyzerService;

pub struct BatchProcessor {
    analyzer: Arc<AnalyzerService>,
    max_batch_files: usize,
    max_item_bytes: usize,
}

impl BatchProcessor {
    pub fn new(settings: &Settings, analyzer: Arc<AnalyzerService>) -> Self {
        Self {
            analyzer,
            max_batch_files: settings.max_batch_files,
            max_item_bytes: settings.max_file_size_bytes(),
        }
    }

    /// Processes every item under `concurrency_limit` in-flight analyses.
    ///
    /// Batch-size and media-type violations reject the whole batch before
    /// any processing starts; everything after that point degrades per item.
    pub async fn run_batch(
        &self,
        items: Vec<BatchItem>,
        concurrency_limit: usize,
    ) -> Result<Vec<BatchOutcome>, AnalysisError> {
        if items.len() > self.max_batch_files {
            return Err(AnalysisError::Content(format!(
                "Máximo {} archivos por lote. Recibidos: {}",
                self.max_batch_files,
                items.len()
            )));
        }
        for item in &items {
            if !item.filename.ends_with(".pdf") {
                return Err(AnalysisError::Content(format!(
                    "Archivo inválido: {} (solo PDFs)",
                    item.filename
                )));
            }
        }

        tracing::info!(files = items.len(), concurrency_limit, "Procesando lote de TDRs");

        let analyzer = self.analyzer.clone();
        let outcomes = run_with_limit(items, concurrency_limit, self.max_item_bytes, move |item| {
            let analyzer = analyzer.clone();
            async move { analyzer.analyze_document(item.bytes, None).await }
        })
        .await;

        Ok(outcomes)
    }
}

/// Semaphore-gated fan-out over `items`, applying `process` to each one.
///
/// Separated from [`BatchProcessor`] so the concurrency and isolation
/// invariants can be exercised with an instrumented closure.
pub(crate) async fn run_with_limit<F, Fut>(
    items: Vec<BatchItem>,
    concurrency_limit: usize,
    max_item_bytes: usize,
    process: F,
) -> Vec<BatchOutcome>
where
    F: Fn(BatchItem) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<TdrAnalysis, AnalysisError>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency_limit));
    let total = items.len();
    let filenames: Vec<String> = items.iter().map(|i| i.filename.clone()).collect();

    let handles: Vec<_> = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let semaphore = semaphore.clone();
            let process = process.clone();
            tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return BatchOutcome::error(item.filename, "Procesamiento cancelado");
                    }
                };

                tracing::info!(
                    index = index + 1,
                    total,
                    file = %item.filename,
                    "Procesando documento del lote"
                );

                // The per-item size check lives inside the bounded region:
                // an oversized document fails alone, not the whole batch.
                if item.bytes.len() > max_item_bytes {
                    let size_mb = item.bytes.len() as f64 / (1024.0 * 1024.0);
                    return BatchOutcome::error(
                        item.filename,
                        format!("Archivo muy grande ({size_mb:.2}MB)"),
                    );
                }

                let filename = item.filename.clone();
                match process(item).await {
                    Ok(analysis) => {
                        tracing::info!(file = %filename, "Documento del lote completado");
                        BatchOutcome::success(filename, analysis)
                    }
                    Err(e) => {
                        tracing::error!(file = %filename, error = %e, "Error en documento del lote");
                        BatchOutcome::error(filename, e.to_string())
                    }
                }
            })
        })
        .collect();

    // Gather in spawn order, so outcomes line up with the input regardless
    // of completion order.
    futures::future::join_all(handles)
        .await
        .into_iter()
        .zip(filenames)
        .map(|(joined, filename)| match joined {
            Ok(outcome) => outcome,
            // A panicked task still yields an outcome for its own slot.
            Err(e) => BatchOutcome::error(
                filename,
                format!("Fallo inesperado al procesar el documento: {e}"),
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::domain::batch::BatchStatus;
    use crate::services::llm::ProviderFactory;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn sample_analysis() -> TdrAnalysis {
        TdrAnalysis {
            executive_summary:
                "Servicio de mantenimiento preventivo y correctivo de equipos informáticos."
                    .to_string(),
            technical_requirements: vec![],
            business_rules: vec![],
            penalty_policies: vec![],
            reference_budget: None,
            compatibility_score: None,
        }
    }

    fn items(n: usize) -> Vec<BatchItem> {
        (0..n)
            .map(|i| BatchItem {
                filename: format!("doc{i}.pdf"),
                bytes: vec![0u8; 4],
            })
            .collect()
    }

    fn processor() -> BatchProcessor {
        let settings = Settings::default();
        let factory = ProviderFactory::new(settings.clone()).unwrap();
        let analyzer = Arc::new(AnalyzerService::new(&settings, factory).unwrap());
        BatchProcessor::new(&settings, analyzer)
    }

    #[tokio::test]
    async fn oversized_batch_is_rejected_whole() {
        let err = processor().run_batch(items(21), 3).await.unwrap_err();
        assert!(err.to_string().contains("Máximo 20 archivos"));
    }

    #[tokio::test]
    async fn non_pdf_item_rejects_the_whole_batch() {
        let mut batch = items(3);
        batch[1].filename = "notas.docx".to_string();
        let err = processor().run_batch(batch, 3).await.unwrap_err();
        assert!(err.to_string().contains("notas.docx"));
    }

    #[tokio::test]
    async fn one_failing_item_degrades_only_its_own_outcome() {
        let outcomes = run_with_limit(items(5), 3, usize::MAX, |item| async move {
            if item.filename == "doc2.pdf" {
                Err(AnalysisError::Provider("timeout simulado".to_string()))
            } else {
                Ok(sample_analysis())
            }
        })
        .await;

        assert_eq!(outcomes.len(), 5);
        for (i, outcome) in outcomes.iter().enumerate() {
            assert_eq!(outcome.filename, format!("doc{i}.pdf"));
            if i == 2 {
                assert_eq!(outcome.status, BatchStatus::Error);
                assert!(outcome.error.as_deref().unwrap().contains("timeout"));
            } else {
                assert_eq!(outcome.status, BatchStatus::Success);
            }
        }
    }

    #[tokio::test]
    async fn a_panicking_item_is_contained() {
        let outcomes = run_with_limit(items(3), 2, usize::MAX, |item| async move {
            if item.filename == "doc1.pdf" {
                panic!("fallo interno");
            }
            Ok(sample_analysis())
        })
        .await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].status, BatchStatus::Success);
        assert_eq!(outcomes[1].status, BatchStatus::Error);
        assert_eq!(outcomes[2].status, BatchStatus::Success);
    }

    #[tokio::test]
    async fn outcome_order_matches_input_order_not_completion_order() {
        // Earlier items sleep longer, so completion order is reversed.
        let outcomes = run_with_limit(items(4), 4, usize::MAX, |item| async move {
            let index: u64 = item.filename[3..4].parse().unwrap();
            tokio::time::sleep(Duration::from_millis(40 - index * 10)).await;
            Ok(sample_analysis())
        })
        .await;

        let names: Vec<&str> = outcomes.iter().map(|o| o.filename.as_str()).collect();
        assert_eq!(names, vec!["doc0.pdf", "doc1.pdf", "doc2.pdf", "doc3.pdf"]);
    }

    #[tokio::test]
    async fn in_flight_work_never_exceeds_the_concurrency_limit() {
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let (current_probe, peak_probe) = (current.clone(), peak.clone());
        let outcomes = run_with_limit(items(10), 3, usize::MAX, move |_item| {
            let current = current_probe.clone();
            let peak = peak_probe.clone();
            async move {
                let in_flight = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(in_flight, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                current.fetch_sub(1, Ordering::SeqCst);
                Ok(sample_analysis())
            }
        })
        .await;

        assert_eq!(outcomes.len(), 10);
        assert!(outcomes.iter().all(BatchOutcome::is_success));
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn oversized_item_errors_alone_and_cites_its_size() {
        let mut batch = items(5);
        batch[3].bytes = vec![0u8; 64];

        let outcomes = run_with_limit(batch, 3, 32, |_item| async move {
            Ok(sample_analysis())
        })
        .await;

        assert_eq!(outcomes.len(), 5);
        assert_eq!(outcomes[3].status, BatchStatus::Error);
        assert!(outcomes[3].error.as_deref().unwrap().contains("grande"));
        assert!(outcomes
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 3)
            .all(|(_, o)| o.is_success()));
    }
}
