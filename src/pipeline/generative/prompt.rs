use crate::pipeline::types::Schema;

pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"
You are a document data extraction assistant. You copy values that are
explicitly present in the document into a JSON object. You never infer,
translate, normalize or invent values.
"#;

/// Build the extraction prompt for one document and the fields still open.
pub fn build_extraction_prompt(text: &str, schema: &Schema) -> String {
    let fields = schema
        .iter()
        .map(|(key, description)| format!("- \"{key}\": ({description})"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Context: The document text is in Portuguese.

Document (filtered text):
---
{text}
---

Task: analyze the document text and extract the data into a valid JSON object.

Rules:
1. Respond ONLY with a valid JSON object.
2. Match the data to the concepts described in the extraction schema.
3. If a field is not found, return null.
4. Return the exact string from the document (e.g., "JOANA D'ARC", "SITUAÇÃO REGULAR").

Extraction schema:
{fields}

Output JSON:"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_every_field_with_description() {
        let mut schema = Schema::new();
        schema.insert("cidade".into(), "Cidade da pesquisa".into());
        schema.insert("produto".into(), "Produto contratado".into());

        let prompt = build_extraction_prompt("Cidade: Mozarlândia", &schema);

        assert!(prompt.contains("- \"cidade\": (Cidade da pesquisa)"));
        assert!(prompt.contains("- \"produto\": (Produto contratado)"));
        assert!(prompt.contains("Cidade: Mozarlândia"));
        assert!(prompt.contains("return null"));
    }

    #[test]
    fn document_is_fenced() {
        let prompt = build_extraction_prompt("BODY", &Schema::new());
        assert!(prompt.contains("---\nBODY\n---"));
    }

    #[test]
    fn system_prompt_forbids_invention() {
        assert!(EXTRACTION_SYSTEM_PROMPT.contains("never infer"));
    }
}
