use serde_json::Value;

use super::GenerativeError;
use crate::pipeline::types::{FieldMap, Schema};

/// Parse a model answer into field values.
///
/// Accepts a bare JSON object or one wrapped in ``` fences. Keys outside
/// `schema` are dropped; null values are kept so callers can see what the
/// model explicitly did not find.
pub fn parse_extraction_response(response: &str, schema: &Schema) -> Result<FieldMap, GenerativeError> {
    let json_str = strip_code_fences(response);
    if json_str.is_empty() {
        return Err(GenerativeError::MalformedResponse("Empty response".into()));
    }

    let value: Value = serde_json::from_str(json_str)
        .map_err(|e| GenerativeError::ResponseParsing(e.to_string()))?;

    let Value::Object(object) = value else {
        return Err(GenerativeError::MalformedResponse(
            "Response is not a JSON object".into(),
        ));
    };

    let dropped = object.keys().filter(|k| !schema.contains_key(*k)).count();
    if dropped > 0 {
        tracing::debug!(dropped, "Ignoring keys outside the schema");
    }

    Ok(object
        .into_iter()
        .filter(|(key, _)| schema.contains_key(key))
        .collect())
}

/// Content between the first pair of ``` fences, or the trimmed input.
fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let after = &trimmed[start + 3..];
    // Skip an info string such as `json`.
    let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after[body_start..];
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(fields: &[&str]) -> Schema {
        fields.iter().map(|f| (f.to_string(), String::new())).collect()
    }

    #[test]
    fn parses_bare_object() {
        let result = parse_extraction_response(r#"{"cidade": "Mozarlândia"}"#, &schema(&["cidade"])).unwrap();
        assert_eq!(result["cidade"], json!("Mozarlândia"));
    }

    #[test]
    fn parses_fenced_object() {
        let response = "Here you go:\n```json\n{\"produto\": \"CONSIGNADO\"}\n```\nDone.";
        let result = parse_extraction_response(response, &schema(&["produto"])).unwrap();
        assert_eq!(result["produto"], json!("CONSIGNADO"));
    }

    #[test]
    fn drops_keys_outside_schema_and_keeps_nulls() {
        let response = r#"{"cidade": null, "extra": "x", "tipo": "CPF"}"#;
        let result = parse_extraction_response(response, &schema(&["cidade", "tipo"])).unwrap();
        assert_eq!(result.len(), 2);
        assert!(result["cidade"].is_null());
        assert!(!result.contains_key("extra"));
    }

    #[test]
    fn rejects_non_object() {
        let err = parse_extraction_response("[1, 2]", &schema(&["a"])).unwrap_err();
        assert!(matches!(err, GenerativeError::MalformedResponse(_)));
    }

    #[test]
    fn rejects_invalid_json() {
        let err = parse_extraction_response("not json", &schema(&["a"])).unwrap_err();
        assert!(matches!(err, GenerativeError::ResponseParsing(_)));
    }

    #[test]
    fn rejects_empty() {
        let err = parse_extraction_response("   ", &schema(&["a"])).unwrap_err();
        assert!(matches!(err, GenerativeError::MalformedResponse(_)));
    }
}
