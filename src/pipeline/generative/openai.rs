use serde::{Deserialize, Serialize};

use super::types::LlmClient;
use super::GenerativeError;

/// Client for OpenAI-compatible `/chat/completions` endpoints.
///
/// Always requests `response_format = json_object`.
pub struct OpenAiClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: Option<String>, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
            timeout_secs,
        }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

fn build_request<'a>(model: &'a str, prompt: &'a str, system: &'a str) -> ChatRequest<'a> {
    let mut messages = Vec::with_capacity(2);
    if !system.trim().is_empty() {
        messages.push(ChatMessage { role: "system", content: system });
    }
    messages.push(ChatMessage { role: "user", content: prompt });

    ChatRequest {
        model,
        messages,
        response_format: ResponseFormat { kind: "json_object" },
    }
}

fn first_choice_content(response: ChatResponse) -> Result<String, GenerativeError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| GenerativeError::MalformedResponse("No message content in response".into()))
}

impl LlmClient for OpenAiClient {
    fn generate(&self, model: &str, prompt: &str, system: &str) -> Result<String, GenerativeError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = build_request(model, prompt, system);

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().map_err(|e| {
            if e.is_connect() {
                GenerativeError::Connection(self.base_url.clone())
            } else if e.is_timeout() {
                GenerativeError::HttpClient(format!("Request timed out after {}s", self.timeout_secs))
            } else {
                GenerativeError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GenerativeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| GenerativeError::ResponseParsing(e.to_string()))?;

        first_choice_content(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_trims_trailing_slash() {
        let client = OpenAiClient::new("https://api.openai.com/v1/", None, 30);
        assert_eq!(client.base_url, "https://api.openai.com/v1");
        assert_eq!(client.timeout_secs, 30);
    }

    #[test]
    fn request_asks_for_json_object() {
        let request = build_request("gpt-5-mini", "prompt", "system");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-5-mini");
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "prompt");
    }

    #[test]
    fn blank_system_prompt_is_omitted() {
        let request = build_request("m", "prompt", "  ");
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, "user");
    }

    #[test]
    fn content_of_first_choice() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"{\"a\":1}"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_choice_content(response).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn missing_choices_is_malformed() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            first_choice_content(response),
            Err(GenerativeError::MalformedResponse(_))
        ));
    }

    #[test]
    fn unreachable_endpoint_is_connection_error() {
        let client = OpenAiClient::new("http://127.0.0.1:9", None, 2);
        let err = client.generate("m", "p", "s").unwrap_err();
        assert!(matches!(
            err,
            GenerativeError::Connection(_) | GenerativeError::HttpClient(_)
        ));
    }
}
