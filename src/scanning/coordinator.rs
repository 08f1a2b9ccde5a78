//! Scan coordinator
//!
//! Builds both scanners from [`Config`] around one content cache and one
//! metrics store, so a long-running caller holds a single instance.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::ai::{
    AiScanner, CredentialChain, EnvCredentials, GeminiBackend, GeminiConfig, GenerativeBackend,
    StaticCredentials,
};
use super::cache::{CacheStats, ContentCache};
use super::error::ScanError;
use super::extractor::ReferenceExtractor;
use super::fetcher::{ContentFetcher, FetcherConfig};
use super::metrics::{MetricsSnapshot, ScanMetrics};
use super::sizes::{ResolverConfig, SizeResolver};
use super::standard::StandardScanner;
use super::transport::{HttpTransport, ReqwestTransport, TransportConfig};
use crate::config::Config;
use crate::types::{FileItem, ScanPreferences, ScanType};

/// Owns the shared scan state and both scan strategies
#[derive(Debug, Clone)]
pub struct ScanCoordinator {
    standard: StandardScanner,
    ai: AiScanner,
    cache: Arc<ContentCache>,
    metrics: Arc<ScanMetrics>,
}

impl ScanCoordinator {
    /// Build with the reqwest transport and the Gemini backend
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(&TransportConfig {
            user_agent: config.fetch.user_agent.clone(),
            ..TransportConfig::default()
        })
        .context("Failed to build HTTP transport")?;

        let backend = GeminiBackend::new(GeminiConfig {
            endpoint: config.ai.endpoint.clone(),
            model: config.ai.model.clone(),
            timeout: Duration::from_secs(config.ai.timeout_secs),
        })
        .context("Failed to build generative AI backend")?;

        Self::with_backends(config, Arc::new(transport), Arc::new(backend))
    }

    /// Build around caller-supplied network seams
    pub fn with_backends(
        config: &Config,
        transport: Arc<dyn HttpTransport>,
        backend: Arc<dyn GenerativeBackend>,
    ) -> Result<Self> {
        let cache = Arc::new(ContentCache::new(
            Duration::from_secs(config.fetch.cache_ttl_secs),
            config.fetch.cache_capacity,
        ));
        let metrics = ScanMetrics::shared();

        let fetcher = ContentFetcher::new(transport.clone(), cache.clone(), fetcher_config(config)?);

        let mut standard = StandardScanner::new(
            fetcher.clone(),
            ReferenceExtractor::new(config.extractor.max_name_length),
            metrics.clone(),
        );
        if config.sizes.enabled {
            standard = standard.with_size_resolver(SizeResolver::new(
                transport,
                ResolverConfig {
                    batch_size: config.sizes.batch_size,
                    probe_timeout: Duration::from_secs(config.sizes.probe_timeout_secs),
                },
            ));
        }

        let mut credentials = CredentialChain::new();
        if let Some(key) = &config.ai.api_key {
            credentials = credentials.with(Arc::new(StaticCredentials::new(Some(key.clone()))));
        }
        credentials = credentials.with(Arc::new(EnvCredentials::new(&config.ai.api_key_env)));

        let ai = AiScanner::new(fetcher, backend, Arc::new(credentials), metrics.clone())
            .with_max_content_chars(config.ai.max_content_chars);

        Ok(Self {
            standard,
            ai,
            cache,
            metrics,
        })
    }

    /// Run one scan of the given type
    pub async fn scan(
        &self,
        scan_type: ScanType,
        url: &str,
        preferences: Option<&ScanPreferences>,
    ) -> Result<Vec<FileItem>, ScanError> {
        match scan_type {
            ScanType::Standard => self.standard.scan(url, preferences).await,
            ScanType::Ai => self.ai.scan(url, preferences).await,
        }
    }

    pub fn standard(&self) -> &StandardScanner {
        &self.standard
    }

    pub fn ai(&self) -> &AiScanner {
        &self.ai
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn metrics_prometheus(&self) -> String {
        self.metrics.to_prometheus()
    }

    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Evict expired pages, returning how many were dropped
    pub fn sweep_cache(&self) -> usize {
        self.cache.sweep_expired()
    }
}

fn fetcher_config(config: &Config) -> Result<FetcherConfig> {
    let proxy_url = match config.fetch.proxy_url.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => {
            Some(Url::parse(raw).with_context(|| format!("Invalid proxy_url '{}'", raw))?)
        }
        _ => None,
    };

    Ok(FetcherConfig {
        proxy_url,
        timeout: Duration::from_secs(config.fetch.timeout_secs),
        max_retries: config.fetch.max_retries,
        retry_base_delay: Duration::from_millis(config.fetch.retry_base_delay_ms),
        retry_max_delay: Duration::from_millis(config.fetch.retry_max_delay_ms),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetcher_config_from_defaults() {
        let config = Config::default();
        let fetcher = fetcher_config(&config).unwrap();
        assert!(fetcher.proxy_url.is_none());
        assert_eq!(fetcher.timeout, Duration::from_secs(30));
        assert_eq!(fetcher.max_retries, 3);
    }

    #[test]
    fn test_fetcher_config_rejects_bad_proxy() {
        let mut config = Config::default();
        config.fetch.proxy_url = Some("not a url".to_string());
        assert!(fetcher_config(&config).is_err());

        config.fetch.proxy_url = Some("  ".to_string());
        assert!(fetcher_config(&config).unwrap().proxy_url.is_none());
    }

    #[tokio::test]
    async fn test_shared_cache_and_metrics() {
        let coordinator = ScanCoordinator::from_config(&Config::default()).unwrap();

        // No proxy configured: the placeholder page is served and not cached
        let files = coordinator
            .standard()
            .discover("https://example.com/")
            .await
            .unwrap();
        assert!(files.iter().any(|f| f.url == "https://example.com/files/document.pdf"));
        assert_eq!(coordinator.cache_stats().size, 0);

        let err = coordinator
            .scan(ScanType::Standard, "http://localhost/", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::Validation(_)));
        assert_eq!(coordinator.metrics().failed_scans, 1);

        coordinator.reset_metrics();
        assert_eq!(coordinator.metrics().total_scans, 0);
    }
}
