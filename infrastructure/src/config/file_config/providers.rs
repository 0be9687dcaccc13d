//! Generation provider configuration from TOML (`[provider]` section)

use serde::{Deserialize, Serialize};

/// OpenAI-compatible chat completions endpoint.
///
/// Any server speaking the `/v1/chat/completions` protocol with tool calls
/// works (OpenAI, Azure OpenAI, vLLM, Ollama).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    /// Environment variable name for the API key (default: "OPENAI_API_KEY").
    pub api_key_env: String,
    /// Direct API key (not recommended; use the env var instead).
    pub api_key: Option<String>,
    /// Base URL of the API.
    pub base_url: String,
    /// Max tokens per response.
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    /// HTTP request timeout.
    pub request_timeout_secs: u64,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            base_url: "https://api.openai.com".to_string(),
            max_tokens: 4096,
            temperature: Some(0.2),
            request_timeout_secs: 120,
        }
    }
}

impl FileProviderConfig {
    /// API key from the config file, else from the configured env var
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }
}
