//! Assembles retrieved fragments (or a whole short document) into the
//! single textual payload sent to the model.

use crate::services::retrieval::FragmentSet;

const CONTEXT_HEADER: &str = "=== CONTEXTO EXTRAÍDO DEL TDR ===\n";
const CONTEXT_FOOTER: &str = "\n\n=== FIN DEL CONTEXTO ===";

/// Renders the fragment set: one `## LABEL:` section per non-empty category,
/// each chunk prefixed with a `[Fragmento N]` marker, wrapped in fixed
/// banners. Deterministic; no size cap is enforced here.
pub fn assemble(fragments: &FragmentSet) -> String {
    let mut parts = vec![CONTEXT_HEADER.to_string()];

    for (category, chunks) in fragments.entries() {
        if chunks.is_empty() {
            continue;
        }
        parts.push(format!("\n## {}:", category.label()));
        for (idx, chunk) in chunks.iter().enumerate() {
            parts.push(format!("\n[Fragmento {}]", idx + 1));
            parts.push(chunk.clone());
        }
    }

    parts.push(CONTEXT_FOOTER.to_string());
    parts.join("\n")
}

/// Wrapper used when a document is short enough to skip retrieval and be
/// sent verbatim.
pub fn full_document_context(full_text: &str) -> String {
    format!(
        "DOCUMENTO COMPLETO DEL TDR:\n\n{full_text}\n\n===== FIN DEL DOCUMENTO ====="
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::retrieval::{Category, FragmentRetriever};
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_sections_with_fragment_markers() {
        let retriever = FragmentRetriever::new(50, 10, 5).unwrap();
        let chunks = vec![
            "se requieren certificaciones ISO 9001 vigentes".to_string(),
            "forma de pago mensual contra conformidad".to_string(),
        ];
        let context = assemble(&retriever.select(&chunks));

        assert!(context.starts_with("=== CONTEXTO EXTRAÍDO DEL TDR ===\n"));
        assert!(context.ends_with("=== FIN DEL CONTEXTO ==="));
        assert!(context.contains("## REQUISITOS:"));
        assert!(context.contains("## FORMA PAGO:"));
        assert!(context.contains("[Fragmento 1]"));
        assert!(context.contains("certificaciones ISO 9001"));
    }

    #[test]
    fn empty_categories_are_omitted() {
        let retriever = FragmentRetriever::new(50, 10, 5).unwrap();
        let chunks = vec!["aplican multas por incumplimiento".to_string()];
        let context = assemble(&retriever.select(&chunks));

        assert!(context.contains("## PENALIDADES:"));
        assert!(!context.contains("## REQUISITOS:"));
        assert!(!context.contains("## PRESUPUESTO:"));
    }

    #[test]
    fn assembly_is_deterministic() {
        let retriever = FragmentRetriever::new(50, 10, 5).unwrap();
        let chunks = vec!["plazo de entrega de 30 días calendario".to_string()];
        let set = retriever.select(&chunks);
        assert_eq!(assemble(&set), assemble(&set));
    }

    #[test]
    fn full_document_context_wraps_text_in_banners() {
        let context = full_document_context("contenido íntegro del documento");
        assert_eq!(
            context,
            "DOCUMENTO COMPLETO DEL TDR:\n\ncontenido íntegro del documento\n\n===== FIN DEL DOCUMENTO ====="
        );
    }
}
