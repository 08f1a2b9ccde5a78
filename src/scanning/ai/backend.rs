//! Generative AI backends
//!
//! The AI scan only needs "send prompt and schema, get JSON text back", so
//! the service sits behind [`GenerativeBackend`]. [`GeminiBackend`] talks to
//! the Gemini REST API.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use std::time::Duration;
use tracing::{debug, info};

use crate::scanning::error::ScanError;
use crate::util::truncate_str;

/// Default Gemini REST base URL
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// A single structured-output request
#[derive(Clone)]
pub struct GenerationRequest {
    pub api_key: String,
    pub prompt: String,
    /// Schema the response text must follow
    pub schema: Value,
}

impl Debug for GenerationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationRequest")
            .field("api_key", &"<redacted>")
            .field("prompt_len", &self.prompt.len())
            .finish()
    }
}

/// Structured-output generation service
#[async_trait]
pub trait GenerativeBackend: Send + Sync + Debug {
    /// Return the raw JSON text produced for `request`.
    ///
    /// Errors are [`ScanError::InvalidCredential`], [`ScanError::QuotaExceeded`],
    /// [`ScanError::Timeout`], [`ScanError::AiRequest`] or [`ScanError::Parse`].
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ScanError>;

    /// Backend name for logs
    fn name(&self) -> &str;
}

/// Configuration for the Gemini backend
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// REST base, e.g. "https://generativelanguage.googleapis.com/v1beta"
    pub endpoint: String,
    /// Model name, e.g. "gemini-2.5-flash"
    pub model: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl GeminiConfig {
    /// `{endpoint}/models/{model}:generateContent`
    pub fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

/// Gemini `generateContent` backend
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: reqwest::Client,
    config: GeminiConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'a str,
    response_schema: &'a Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Google API error envelope
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}

impl GeminiBackend {
    pub fn new(config: GeminiConfig) -> Result<Self, ScanError> {
        info!(
            "Initializing Gemini backend: endpoint={}, model={}",
            config.endpoint, config.model
        );

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ScanError::AiRequest(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ScanError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: &request.schema,
            },
        };

        let url = self.config.generate_url();
        debug!("Sending generateContent request to {}", url);

        let api_key = HeaderValue::from_str(&request.api_key)
            .map_err(|_| ScanError::InvalidCredential("API key contains invalid characters".to_string()))?;

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error(e, self.config.timeout))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| request_error(e, self.config.timeout))?;

        if !(200..300).contains(&status) {
            return Err(classify_api_error(status, &text));
        }

        extract_text(&text)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

fn request_error(e: reqwest::Error, timeout: Duration) -> ScanError {
    if e.is_timeout() {
        ScanError::Timeout(timeout)
    } else {
        ScanError::AiRequest(e.to_string())
    }
}

/// Map a non-2xx Gemini response onto the error taxonomy
pub(crate) fn classify_api_error(status: u16, body: &str) -> ScanError {
    let parsed = serde_json::from_str::<ErrorResponse>(body).ok().map(|r| r.error);

    let message = parsed
        .as_ref()
        .map(|e| e.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| truncate_str(body.trim(), 200));
    let api_status = parsed.as_ref().and_then(|e| e.status.clone()).unwrap_or_default();
    let key_invalid = parsed
        .as_ref()
        .map(|e| {
            e.details
                .iter()
                .any(|d| d.reason.as_deref() == Some("API_KEY_INVALID"))
        })
        .unwrap_or(false);

    if status == 429 || api_status == "RESOURCE_EXHAUSTED" {
        ScanError::QuotaExceeded(message)
    } else if status == 401
        || status == 403
        || key_invalid
        || api_status == "UNAUTHENTICATED"
        || api_status == "PERMISSION_DENIED"
    {
        ScanError::InvalidCredential(message)
    } else {
        ScanError::AiRequest(format!("API error ({}): {}", status, message))
    }
}

/// Concatenated text parts of the first candidate
pub(crate) fn extract_text(body: &str) -> Result<String, ScanError> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| ScanError::Parse(format!("unexpected response envelope: {}", e)))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ScanError::Parse("response contained no text".to_string()));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_config_default() {
        let config = GeminiConfig::default();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(
            config.generate_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_generate_url_trims_trailing_slash() {
        let config = GeminiConfig {
            endpoint: "https://proxy.test/v1/".to_string(),
            model: "m".to_string(),
            ..GeminiConfig::default()
        };
        assert_eq!(config.generate_url(), "https://proxy.test/v1/models/m:generateContent");
    }

    #[test]
    fn test_request_body_shape() {
        let schema = serde_json::json!({"type": "ARRAY"});
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: "hello" }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: &schema,
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(value["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(value["generationConfig"]["responseSchema"]["type"], "ARRAY");
    }

    #[test]
    fn test_extract_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"[{\"a\":"},{"text":"1}]"}]}}]}"#;
        assert_eq!(extract_text(body).unwrap(), "[{\"a\":1}]");

        assert!(matches!(extract_text(r#"{"candidates":[]}"#), Err(ScanError::Parse(_))));
        assert!(matches!(extract_text("<html>"), Err(ScanError::Parse(_))));
    }

    #[test]
    fn test_quota_errors() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded for requests","status":"RESOURCE_EXHAUSTED"}}"#;
        match classify_api_error(429, body) {
            ScanError::QuotaExceeded(msg) => assert_eq!(msg, "Quota exceeded for requests"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_invalid_key_errors() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT","details":[{"@type":"type.googleapis.com/google.rpc.ErrorInfo","reason":"API_KEY_INVALID"}]}}"#;
        assert!(matches!(classify_api_error(400, body), ScanError::InvalidCredential(_)));
        assert!(matches!(classify_api_error(403, ""), ScanError::InvalidCredential(_)));
    }

    #[test]
    fn test_other_errors_are_request_failures() {
        let err = classify_api_error(500, "upstream failure");
        assert!(matches!(&err, ScanError::AiRequest(msg) if msg.contains("upstream failure")));
        assert!(!err.is_credential_error());
    }
}
