//! Pipeline configuration derived from the process environment.
//!
//! Selects the generative provider, model and timeout, and the location of
//! the cache store. CLI flags override individual values after derivation.

use std::path::PathBuf;

use serde::Serialize;

use crate::config;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Which generative backend answers Stage 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// OpenAI-compatible `/chat/completions` endpoint.
    OpenAi,
    /// Local Ollama `/api/generate`.
    Ollama,
    /// No backend: Stage 3 always fails and leaves fields null.
    Disabled,
}

impl Provider {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "ollama" => Some(Self::Ollama),
            "none" | "disabled" | "off" => Some(Self::Disabled),
            _ => None,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Ollama => "http://localhost:11434",
            Self::Disabled => "",
        }
    }
}

/// Generative backend settings.
#[derive(Debug, Clone, Serialize)]
pub struct BackendConfig {
    pub provider: Provider,
    pub model: String,
    pub base_url: String,
    /// Never serialized: keeps keys out of logs and reports.
    #[serde(skip)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    pub cache_path: PathBuf,
    pub backend: BackendConfig,
}

pub const DEFAULT_MODEL: &str = "gpt-5-mini";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

// ═══════════════════════════════════════════════════════════
// Derivation
// ═══════════════════════════════════════════════════════════

impl PipelineConfig {
    /// Derive config from the real process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Derive config from any key lookup.
    ///
    /// Provider defaults to OpenAI when `OPENAI_API_KEY` is set and to
    /// `Disabled` otherwise; an explicit `DOCFIELDS_PROVIDER` wins.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty());

        let provider = match lookup("DOCFIELDS_PROVIDER") {
            Some(raw) => Provider::from_str(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "Unknown DOCFIELDS_PROVIDER, disabling generative stage");
                Provider::Disabled
            }),
            None if api_key.is_some() => Provider::OpenAi,
            None => Provider::Disabled,
        };

        let timeout_secs = lookup("DOCFIELDS_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            cache_path: lookup("DOCFIELDS_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(config::default_cache_path),
            backend: BackendConfig {
                provider,
                model: lookup("DOCFIELDS_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                base_url: lookup("DOCFIELDS_BASE_URL")
                    .unwrap_or_else(|| provider.default_base_url().to_string()),
                api_key,
                timeout_secs,
            },
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
