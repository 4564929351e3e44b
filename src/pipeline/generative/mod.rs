//! Stage 3: generative fallback.
//!
//! [`LlmBackend`] turns (text, schema) into a prompt, sends it through an
//! [`LlmClient`] and parses the JSON object that comes back. Clients exist
//! for OpenAI-compatible endpoints and local Ollama.

pub mod types;
pub mod prompt;
pub mod parser;
pub mod openai;
pub mod ollama;
pub mod backend;

pub use types::*;
pub use prompt::*;
pub use parser::*;
pub use openai::*;
pub use ollama::*;
pub use backend::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerativeError {
    #[error("LLM endpoint is not reachable at {0}")]
    Connection(String),

    #[error("LLM endpoint returned error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("No generative backend configured")]
    NotConfigured,
}
