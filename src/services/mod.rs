//! Service layer: extraction, retrieval, context assembly, LLM clients and
//! the single-document/batch orchestrators.

pub mod analyzer;
pub mod batch;
pub mod context;
pub mod llm;
pub mod pdf;
pub mod retrieval;

pub use analyzer::AnalyzerService;
pub use batch::BatchProcessor;
pub use llm::{ProviderClient, ProviderFactory};
pub use pdf::PdfExtractor;
