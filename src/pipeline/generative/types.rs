use super::GenerativeError;
use crate::pipeline::types::{FieldMap, Schema};

/// Raw text-in, text-out model access.
pub trait LlmClient: Send + Sync {
    fn generate(&self, model: &str, prompt: &str, system: &str) -> Result<String, GenerativeError>;
}

/// Stage 3 contract: resolve fields of `schema` from free text.
///
/// Implementations may return fewer keys than requested; the caller
/// ignores keys outside the schema and null values.
pub trait GenerativeBackend: Send + Sync {
    fn extract(&self, text: &str, schema: &Schema) -> Result<FieldMap, GenerativeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traits_are_object_safe() {
        fn _assert_client(_: &dyn LlmClient) {}
        fn _assert_backend(_: &dyn GenerativeBackend) {}
    }
}
