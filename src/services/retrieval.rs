//! Rule-based fragment retrieval over raw document text.
//!
//! A retrieval substitute without embeddings or a vector index: the document
//! is word-windowed into overlapping chunks and each analytical category
//! keeps the first chunks its patterns hit. Deterministic and stateless.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::AnalysisError;

lazy_static! {
    static ref REQUIREMENT_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)requisitos?\s+(?:del\s+)?(?:postor|proveedor|contratista)").unwrap(),
        Regex::new(r"(?i)condiciones?\s+(?:técnicas?|del\s+servicio)").unwrap(),
        Regex::new(r"(?i)especificaciones?\s+técnicas?").unwrap(),
        Regex::new(r"(?i)perfil\s+(?:del\s+)?(?:postor|proveedor)").unwrap(),
        Regex::new(r"(?i)experiencia\s+(?:requerida|mínima)").unwrap(),
        Regex::new(r"(?i)certificaciones?").unwrap(),
        Regex::new(r"(?i)calificaciones?").unwrap(),
    ];
    static ref PENALTY_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)penalidad(?:es)?").unwrap(),
        Regex::new(r"(?i)multas?").unwrap(),
        Regex::new(r"(?i)sanciones?").unwrap(),
        Regex::new(r"(?i)incumplimiento").unwrap(),
        Regex::new(r"(?i)garantías?").unwrap(),
        Regex::new(r"(?i)responsabilidad\s+contractual").unwrap(),
    ];
    static ref PAYMENT_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)forma\s+de\s+pago").unwrap(),
        Regex::new(r"(?i)modalidad\s+de\s+pago").unwrap(),
        Regex::new(r"(?i)cronograma\s+de\s+pago").unwrap(),
        Regex::new(r"(?i)desembolsos?").unwrap(),
        Regex::new(r"(?i)facturación").unwrap(),
        Regex::new(r"(?i)pagos?\s+parciales?").unwrap(),
    ];
    static ref DEADLINE_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)plazos?\s+(?:de\s+)?(?:ejecución|entrega|cumplimiento)").unwrap(),
        Regex::new(r"(?i)cronograma\s+(?:de\s+)?(?:ejecución|actividades)").unwrap(),
        Regex::new(r"(?i)duración\s+del\s+(?:contrato|servicio)").unwrap(),
        Regex::new(r"(?i)vigencia\s+(?:del\s+)?contrato").unwrap(),
        Regex::new(r"(?i)fecha\s+de\s+(?:inicio|término)").unwrap(),
    ];
    // The second pattern catches amounts in soles even without a labeling phrase.
    static ref BUDGET_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)(?:presupuesto|monto|valor)\s+(?:referencial|estimado|total)").unwrap(),
        Regex::new(r"(?i)s/\.?\s*\d+(?:,\d{3})*(?:\.\d{2})?").unwrap(),
        Regex::new(r"(?i)valor\s+(?:referencial|estimado)").unwrap(),
        Regex::new(r"(?i)costo\s+(?:total|estimado)").unwrap(),
    ];
}

/// Analytical sections of a procurement document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Requirements,
    Penalties,
    PaymentTerms,
    Deadlines,
    Budget,
}

impl Category {
    /// Enumeration order is load-bearing: a chunk matching several
    /// categories is retained by the first one listed here.
    pub const ALL: [Category; 5] = [
        Category::Requirements,
        Category::Penalties,
        Category::PaymentTerms,
        Category::Deadlines,
        Category::Budget,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Requirements => "requisitos",
            Self::Penalties => "penalidades",
            Self::PaymentTerms => "forma_pago",
            Self::Deadlines => "plazos",
            Self::Budget => "presupuesto",
        }
    }

    pub fn label(&self) -> String {
        self.key().to_uppercase().replace('_', " ")
    }

    fn patterns(&self) -> &'static [Regex] {
        match self {
            Self::Requirements => &REQUIREMENT_PATTERNS,
            Self::Penalties => &PENALTY_PATTERNS,
            Self::PaymentTerms => &PAYMENT_PATTERNS,
            Self::Deadlines => &DEADLINE_PATTERNS,
            Self::Budget => &BUDGET_PATTERNS,
        }
    }
}

/// Per-category retained chunks, in category enumeration order.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentSet {
    entries: Vec<(Category, Vec<String>)>,
}

impl FragmentSet {
    pub fn entries(&self) -> impl Iterator<Item = (Category, &[String])> {
        self.entries.iter().map(|(c, v)| (*c, v.as_slice()))
    }

    pub fn get(&self, category: Category) -> &[String] {
        self.entries
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn total_fragments(&self) -> usize {
        self.entries.iter().map(|(_, v)| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_fragments() == 0
    }
}

/// Word-windowed chunking plus pattern-driven chunk selection.
pub struct FragmentRetriever {
    chunk_size: usize,
    chunk_overlap: usize,
    top_k: usize,
}

impl FragmentRetriever {
    pub fn new(chunk_size: usize, chunk_overlap: usize, top_k: usize) -> Result<Self, AnalysisError> {
        if chunk_overlap >= chunk_size {
            return Err(AnalysisError::Configuration(format!(
                "chunk_overlap ({chunk_overlap}) debe ser menor que chunk_size ({chunk_size})"
            )));
        }
        if top_k == 0 {
            return Err(AnalysisError::Configuration(
                "top_k_chunks debe ser mayor que cero".to_string(),
            ));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            top_k,
        })
    }

    /// Splits `text` into chunks of `chunk_size` words, each window advancing
    /// by `chunk_size - chunk_overlap` words.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let step = self.chunk_size - self.chunk_overlap;

        let mut chunks = Vec::new();
        let mut start = 0;
        while start < words.len() {
            let end = (start + self.chunk_size).min(words.len());
            chunks.push(words[start..end].join(" "));
            start += step;
        }
        chunks
    }

    /// Assigns chunks to categories. Categories are scanned in enumeration
    /// order and the first category whose patterns hit a chunk consumes it;
    /// each category keeps at most `top_k` chunks in discovery order.
    pub fn select(&self, chunks: &[String]) -> FragmentSet {
        let mut used = vec![false; chunks.len()];
        let mut entries: Vec<(Category, Vec<String>)> = Category::ALL
            .iter()
            .map(|c| (*c, Vec::new()))
            .collect();

        for (category, retained) in entries.iter_mut() {
            for (idx, chunk) in chunks.iter().enumerate() {
                if used[idx] {
                    continue;
                }
                if category.patterns().iter().any(|p| p.is_match(chunk)) {
                    used[idx] = true;
                    if retained.len() < self.top_k {
                        retained.push(chunk.clone());
                    }
                }
            }
        }

        let total: usize = entries.iter().map(|(_, v)| v.len()).sum();
        for (category, retained) in entries.iter() {
            tracing::debug!(category = category.key(), fragments = retained.len());
        }
        tracing::info!(total, chunks = chunks.len(), "Fragmentos extraídos");

        // Without a single pattern hit the model would receive no content at
        // all; fall back to the leading chunks split between two categories.
        if total == 0 {
            tracing::warn!(
                "No se encontraron patrones específicos, usando primeros chunks del documento"
            );
            let per_category = chunks.len().min(10) / 2;
            for (category, retained) in entries.iter_mut() {
                match category {
                    Category::Requirements => {
                        *retained = chunks[..per_category].to_vec();
                    }
                    Category::Deadlines => {
                        *retained = chunks[per_category..per_category * 2].to_vec();
                    }
                    _ => {}
                }
            }
        }

        FragmentSet { entries }
    }
}
