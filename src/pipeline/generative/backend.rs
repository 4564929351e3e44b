use super::ollama::OllamaClient;
use super::openai::OpenAiClient;
use super::parser::parse_extraction_response;
use super::prompt::{build_extraction_prompt, EXTRACTION_SYSTEM_PROMPT};
use super::types::{GenerativeBackend, LlmClient};
use super::GenerativeError;
use crate::pipeline::types::{FieldMap, Schema};
use crate::pipeline_config::{BackendConfig, Provider};

/// Generative backend driven by a chat-style model.
pub struct LlmBackend {
    client: Box<dyn LlmClient>,
    model: String,
}

impl LlmBackend {
    pub fn new(client: Box<dyn LlmClient>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl GenerativeBackend for LlmBackend {
    fn extract(&self, text: &str, schema: &Schema) -> Result<FieldMap, GenerativeError> {
        let prompt = build_extraction_prompt(text, schema);
        tracing::info!(
            model = %self.model,
            fields = schema.len(),
            prompt_chars = prompt.len(),
            "Calling generative backend"
        );

        let response = self.client.generate(&self.model, &prompt, EXTRACTION_SYSTEM_PROMPT)?;
        parse_extraction_response(&response, schema)
    }
}

/// Backend used when no provider is configured. Every call fails, so the
/// pipeline leaves unresolved fields null.
#[derive(Debug, Default)]
pub struct DisabledBackend;

impl GenerativeBackend for DisabledBackend {
    fn extract(&self, _text: &str, _schema: &Schema) -> Result<FieldMap, GenerativeError> {
        Err(GenerativeError::NotConfigured)
    }
}

/// Build the backend selected by `config`.
pub fn build_backend(config: &BackendConfig) -> Box<dyn GenerativeBackend> {
    match config.provider {
        Provider::OpenAi => {
            if config.api_key.is_none() {
                tracing::warn!("OpenAI provider selected without OPENAI_API_KEY");
            }
            let client = OpenAiClient::new(&config.base_url, config.api_key.clone(), config.timeout_secs);
            Box::new(LlmBackend::new(Box::new(client), &config.model))
        }
        Provider::Ollama => {
            let client = OllamaClient::new(&config.base_url, config.timeout_secs);
            Box::new(LlmBackend::new(Box::new(client), &config.model))
        }
        Provider::Disabled => {
            tracing::info!("Generative stage disabled");
            Box::new(DisabledBackend)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::generative::MockLlmClient;
    use serde_json::json;

    fn schema(fields: &[&str]) -> Schema {
        fields.iter().map(|f| (f.to_string(), String::new())).collect()
    }

    #[test]
    fn backend_parses_and_filters_model_answer() {
        let client = MockLlmClient::new(r#"{"endereco": "Rua A, 10", "nome": "X", "telefone": null}"#);
        let backend = LlmBackend::new(Box::new(client), "gpt-5-mini");

        let result = backend.extract("text", &schema(&["endereco", "telefone"])).unwrap();

        assert_eq!(result["endereco"], json!("Rua A, 10"));
        assert!(result["telefone"].is_null());
        assert!(!result.contains_key("nome"));
        assert_eq!(backend.model(), "gpt-5-mini");
    }

    #[test]
    fn backend_propagates_client_errors() {
        let backend = LlmBackend::new(Box::new(MockLlmClient::failing("down")), "m");
        assert!(backend.extract("text", &schema(&["a"])).is_err());
    }

    #[test]
    fn disabled_backend_always_fails() {
        let err = DisabledBackend.extract("text", &schema(&["a"])).unwrap_err();
        assert!(matches!(err, GenerativeError::NotConfigured));
    }

    #[test]
    fn build_disabled_backend() {
        let config = BackendConfig {
            provider: Provider::Disabled,
            model: "m".into(),
            base_url: String::new(),
            api_key: None,
            timeout_secs: 1,
        };
        let backend = build_backend(&config);
        assert!(matches!(
            backend.extract("t", &schema(&["a"])),
            Err(GenerativeError::NotConfigured)
        ));
    }
}
