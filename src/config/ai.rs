//! Generative AI configuration

use serde::{Deserialize, Serialize};

use crate::scanning::ai::{DEFAULT_GEMINI_ENDPOINT, DEFAULT_GEMINI_MODEL, DEFAULT_MAX_CONTENT_CHARS};

/// AI scan configuration
///
/// The API key is read from `api_key` if set, otherwise from the
/// environment variable named by `api_key_env`.
///
/// ```toml
/// [ai]
/// model = "gemini-2.5-flash"
/// api_key_env = "GEMINI_API_KEY"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// REST base URL
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Inline API key (takes precedence over the environment)
    pub api_key: Option<String>,
    /// Request timeout (seconds)
    pub timeout_secs: u64,
    /// Page characters sent with the prompt
    pub max_content_chars: usize,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            api_key: None,
            timeout_secs: 60,
            max_content_chars: DEFAULT_MAX_CONTENT_CHARS,
        }
    }
}
