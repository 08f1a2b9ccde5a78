//! AI-assisted scan
//!
//! Extraction is delegated to a generative AI service: the fetched page is
//! sent with a response schema, and the returned JSON is validated into
//! file items before preferences are applied.

mod backend;
mod credentials;
mod parse;
mod prompt;

pub use backend::{
    GeminiBackend, GeminiConfig, GenerationRequest, GenerativeBackend, DEFAULT_GEMINI_ENDPOINT,
    DEFAULT_GEMINI_MODEL,
};
pub use credentials::{
    resolve_api_key, CredentialChain, CredentialSource, EnvCredentials, StaticCredentials,
};
pub use parse::parse_ai_response;
pub use prompt::{build_prompt, response_schema, DEFAULT_MAX_CONTENT_CHARS};

use std::sync::Arc;
use tokio::time::Instant;

use super::error::ScanError;
use super::fetcher::ContentFetcher;
use super::filter::apply_preferences;
use super::metrics::ScanMetrics;
use super::validate::validate_target;
use crate::types::{FileItem, ScanPreferences, ScanType};

/// Runs AI scans and records their outcome
#[derive(Debug, Clone)]
pub struct AiScanner {
    fetcher: ContentFetcher,
    backend: Arc<dyn GenerativeBackend>,
    credentials: Arc<dyn CredentialSource>,
    metrics: Arc<ScanMetrics>,
    max_content_chars: usize,
}

impl AiScanner {
    pub fn new(
        fetcher: ContentFetcher,
        backend: Arc<dyn GenerativeBackend>,
        credentials: Arc<dyn CredentialSource>,
        metrics: Arc<ScanMetrics>,
    ) -> Self {
        Self {
            fetcher,
            backend,
            credentials,
            metrics,
            max_content_chars: DEFAULT_MAX_CONTENT_CHARS,
        }
    }

    /// Cap on page characters embedded in the prompt (builder pattern)
    pub fn with_max_content_chars(mut self, max_content_chars: usize) -> Self {
        self.max_content_chars = max_content_chars;
        self
    }

    /// Scan `url`, optionally filtering by `preferences`
    pub async fn scan(
        &self,
        url: &str,
        preferences: Option<&ScanPreferences>,
    ) -> Result<Vec<FileItem>, ScanError> {
        let start = Instant::now();
        tracing::info!("Starting AI scan of {} via {}", url, self.backend.name());

        let result = self.run(url, preferences).await;
        match &result {
            Ok(files) => {
                tracing::info!("AI scan of {} found {} files", url, files.len());
                self.metrics
                    .record_success(ScanType::Ai, files.len(), start.elapsed());
            }
            Err(e) => {
                tracing::warn!("AI scan of {} failed: {}", url, e);
                self.metrics.record_failure(ScanType::Ai, e, start.elapsed());
            }
        }
        result
    }

    async fn run(
        &self,
        url: &str,
        preferences: Option<&ScanPreferences>,
    ) -> Result<Vec<FileItem>, ScanError> {
        let api_key = resolve_api_key(self.credentials.as_ref()).await?;
        let page_url = validate_target(url)?;
        let content = self.fetcher.fetch(page_url.as_str()).await?;

        let request = GenerationRequest {
            api_key,
            prompt: build_prompt(&page_url, &content, self.max_content_chars),
            schema: response_schema(),
        };
        let text = self.backend.generate(&request).await?;
        let files = parse_ai_response(&text, &page_url)?;

        Ok(apply_preferences(files, preferences))
    }
}
