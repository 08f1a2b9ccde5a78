//! API key lookup for the AI scan

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

use crate::scanning::error::ScanError;

/// Async source of the generative AI API key
#[async_trait]
pub trait CredentialSource: Send + Sync + Debug {
    /// The key, or `None` when it is not configured
    async fn api_key(&self) -> Option<String>;
}

/// Key read from an environment variable at lookup time
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl CredentialSource for EnvCredentials {
    async fn api_key(&self) -> Option<String> {
        std::env::var(&self.var).ok()
    }
}

/// Key fixed at construction (config file or tests)
#[derive(Clone, Default)]
pub struct StaticCredentials {
    key: Option<String>,
}

impl StaticCredentials {
    pub fn new(key: Option<String>) -> Self {
        Self { key }
    }
}

impl Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[async_trait]
impl CredentialSource for StaticCredentials {
    async fn api_key(&self) -> Option<String> {
        self.key.clone()
    }
}

/// First source that yields a non-blank key wins
#[derive(Debug, Clone, Default)]
pub struct CredentialChain {
    sources: Vec<Arc<dyn CredentialSource>>,
}

impl CredentialChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source (builder pattern)
    pub fn with(mut self, source: Arc<dyn CredentialSource>) -> Self {
        self.sources.push(source);
        self
    }
}

#[async_trait]
impl CredentialSource for CredentialChain {
    async fn api_key(&self) -> Option<String> {
        for source in &self.sources {
            if let Some(key) = source.api_key().await.filter(|k| !k.trim().is_empty()) {
                return Some(key);
            }
        }
        None
    }
}

/// Look up the key, failing with [`ScanError::MissingCredential`] when it is
/// absent or blank
pub async fn resolve_api_key(source: &dyn CredentialSource) -> Result<String, ScanError> {
    match source.api_key().await {
        Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(ScanError::MissingCredential),
    }
}
