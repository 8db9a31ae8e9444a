//! Prompt templates shared by the vendor adapters.
//!
//! All prompts are in Spanish, matching the SEACE documents they analyze.
//! The system instruction pins the exact JSON schema the response parser
//! and the domain validators expect.

use serde_json::Value;

/// Fixed system instruction for structured TDR analysis.
pub const SYSTEM_PROMPT: &str = r#"
Eres un analista experto en licitaciones públicas del SEACE (Perú) con más de 10 años de experiencia.

Tu misión es analizar Términos de Referencia (TDR) de contratos menores y proporcionar un análisis técnico estructurado que ayude a un proveedor a decidir si debe postular o no.

**INSTRUCCIONES CRÍTICAS:**

1. **Ignora el relleno legal**: No pierdas tiempo en cláusulas genéricas o texto legal estándar.

2. **Céntrate en lo accionable**: Identifica requisitos técnicos específicos, certificaciones, experiencia requerida, tecnologías, y cualquier barrera de entrada.

3. **Extrae reglas de negocio**: Obligaciones del proveedor, entregables, KPIs, condiciones especiales.

4. **Identifica riesgos**: Penalidades severas, garantías excesivas, plazos irreales, cláusulas punitivas.

5. **Evalúa viabilidad**: Asigna un score de compatibilidad (1-10) basado en:
   - Claridad de los requisitos (10 = muy claro, 1 = ambiguo)
   - Viabilidad técnica (10 = fácil de cumplir, 1 = imposible)
   - Riesgo contractual (10 = bajo riesgo, 1 = alto riesgo)

6. **Formato de salida**: DEBES responder ÚNICAMENTE con un objeto JSON válido con esta estructura exacta:

```json
{
  "resumen_ejecutivo": "Resumen técnico en 2-3 párrafos sobre qué busca la entidad y qué se necesita para ganar",
  "requisitos_tecnicos": ["Lista de requisitos técnicos específicos como tecnologías, certificaciones, experiencia. PUEDE SER ARRAY VACÍO [] si no hay información clara"],
  "reglas_de_negocio": ["Lista de obligaciones, entregables, condiciones contractuales. PUEDE SER ARRAY VACÍO [] si no hay información clara"],
  "politicas_y_penalidades": ["Lista de penalidades, multas, garantías, o lista vacía si no hay"],
  "presupuesto_referencial": "Monto en soles o null si no se especifica",
  "score_compatibilidad": 7
}
```

**IMPORTANTE:**
- NO agregues texto adicional fuera del JSON. NO uses markdown. Solo devuelve el JSON puro.
- Si el TDR no tiene información clara sobre requisitos técnicos o reglas de negocio, devuelve arrays vacíos [] en esos campos.
"#;

/// System instruction for the compatibility evaluation pass.
pub const COMPATIBILITY_SYSTEM_PROMPT: &str = r#"
Eres un analista de licitaciones del SEACE (Perú). Comparas el perfil comercial de un suscriptor contra el análisis estructurado de un TDR y emites un veredicto de compatibilidad.

Responde ÚNICAMENTE con un objeto JSON válido, sin markdown ni texto adicional.
"#;

pub fn analysis_user_prompt(context: &str) -> String {
    format!(
        r#"
Analiza el siguiente TDR del SEACE y devuelve el análisis estructurado en formato JSON:

{context}

Recuerda: Devuelve SOLO el objeto JSON sin texto adicional.
"#
    )
}

/// Prompt used when the PDF is sent to the model as a native document part.
pub const DOCUMENT_ANALYSIS_PROMPT: &str = r#"
Analiza este TDR del SEACE (Perú) y devuelve ÚNICAMENTE un JSON con las siguientes claves:
{
    "resumen_ejecutivo": "100-200 palabras sobre objetivos y alcance",
    "requisitos_tecnicos": ["certificaciones, experiencia o equipamiento requerido"],
    "reglas_de_negocio": ["plazos, lugar de entrega, modalidad de pago, garantías"],
    "politicas_y_penalidades": ["multas, sanciones, porcentajes"],
    "presupuesto_referencial": "S/ X,XXX.XX" o null
}

Reglas:
- Si algún bloque no aparece en el PDF, devuelve [] o null.
- Máximo 10 items por lista.
- No incluyas texto fuera del JSON ni bloques ```json.
"#;

/// Comparison prompt embedding the subscriber profile, the serialized prior
/// analysis, and the optional contract metadata and keyword list.
pub fn compatibility_prompt(
    company_copy: &str,
    tdr_analysis: &Value,
    contract_context: Option<&Value>,
    keywords: &[String],
) -> String {
    let analysis_json =
        serde_json::to_string_pretty(tdr_analysis).unwrap_or_else(|_| tdr_analysis.to_string());

    let mut sections = vec![
        "Evalúa la compatibilidad entre el perfil del suscriptor y el análisis del TDR.".to_string(),
        format!("PERFIL DEL SUSCRIPTOR:\n{company_copy}"),
        format!("ANÁLISIS DEL TDR:\n{analysis_json}"),
    ];

    if let Some(contract) = contract_context {
        let contract_json =
            serde_json::to_string_pretty(contract).unwrap_or_else(|_| contract.to_string());
        sections.push(format!("CONTEXTO DEL CONTRATO:\n{contract_json}"));
    }

    if !keywords.is_empty() {
        sections.push(format!("KEYWORDS SUSCRITAS:\n{}", keywords.join(", ")));
    }

    sections.push(
        r#"Devuelve ÚNICAMENTE un JSON con esta estructura:
{
  "score": 7.5,
  "nivel": "apto" | "revisar" | "descartar",
  "explicacion": "Motivo resumido del score asignado (2-4 oraciones)",
  "factores_clave": ["elementos del TDR que favorecen la compatibilidad"],
  "riesgos": ["alertas o restricciones detectadas"]
}

Criterios:
- score: decimal entre 0 y 10 (10 = encaje total con el rubro y capacidades del suscriptor).
- nivel: "apto" si score >= 8, "revisar" si score >= 5, "descartar" en otro caso.
- Considera rubro, experiencia, certificaciones, capacidad operativa y los riesgos del TDR."#
            .to_string(),
    );

    sections.join("\n\n")
}
