//! Best-effort file size resolution
//!
//! Sizes come from the Content-Length header of a HEAD probe. Probes run
//! in fixed-size batches: probes inside a batch run concurrently, batches
//! run one after another. Every failure degrades to a size of 0 for that
//! URL only.

use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::transport::HttpTransport;
use super::validate::check_url;

/// Runtime settings for the size resolver
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Probes in flight at once
    pub batch_size: usize,
    /// Bound for a single probe
    pub probe_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            probe_timeout: Duration::from_secs(10),
        }
    }
}

/// Resolves byte sizes for discovered files
#[derive(Debug, Clone)]
pub struct SizeResolver {
    transport: Arc<dyn HttpTransport>,
    config: ResolverConfig,
}

impl SizeResolver {
    pub fn new(transport: Arc<dyn HttpTransport>, config: ResolverConfig) -> Self {
        Self { transport, config }
    }

    /// Map every input URL to its size, 0 when unknown. Never fails.
    pub async fn resolve_sizes(&self, urls: &[String]) -> HashMap<String, u64> {
        let mut sizes = HashMap::with_capacity(urls.len());
        let batch_size = self.config.batch_size.max(1);

        for (batch_index, batch) in urls.chunks(batch_size).enumerate() {
            tracing::debug!(
                "Probing sizes for batch {} ({} URLs)",
                batch_index + 1,
                batch.len()
            );
            let results = join_all(batch.iter().map(|url| self.probe(url))).await;
            for (url, size) in batch.iter().zip(results) {
                sizes.insert(url.clone(), size);
            }
        }

        sizes
    }

    async fn probe(&self, raw: &str) -> u64 {
        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Skipping size probe for unparseable URL {}: {}", raw, e);
                return 0;
            }
        };
        if let Err(e) = check_url(&url) {
            tracing::debug!("Skipping size probe for {}: {}", raw, e);
            return 0;
        }

        match tokio::time::timeout(self.config.probe_timeout, self.transport.head(&url)).await {
            Ok(Ok(response)) if response.is_success() => response.content_length.unwrap_or(0),
            Ok(Ok(response)) => {
                tracing::debug!("Size probe for {} returned status {}", raw, response.status);
                0
            }
            Ok(Err(e)) => {
                tracing::debug!("Size probe for {} failed: {}", raw, e);
                0
            }
            Err(_) => {
                tracing::debug!("Size probe for {} timed out", raw);
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanning::transport::{TransportError, TransportResponse};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers HEAD with a length derived from the path; `/down` fails,
    /// `/slow` never answers. Tracks peak concurrency.
    #[derive(Debug, Default)]
    struct FakeHeadTransport {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        probed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl HttpTransport for FakeHeadTransport {
        async fn get(&self, _url: &Url) -> Result<TransportResponse, TransportError> {
            Err(TransportError::Other("GET not expected".into()))
        }

        async fn head(&self, url: &Url) -> Result<TransportResponse, TransportError> {
            self.probed.lock().push(url.to_string());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match url.path() {
                "/down" => Err(TransportError::Connect("refused".into())),
                "/slow" => std::future::pending().await,
                "/missing" => Ok(TransportResponse::with_status(404, "")),
                "/nolength" => Ok(TransportResponse::ok("")),
                path => {
                    let n: u64 = path.trim_start_matches("/f").parse().unwrap_or(1);
                    Ok(TransportResponse {
                        status: 200,
                        content_length: Some(n * 100),
                        body: String::new(),
                    })
                }
            }
        }
    }

    fn resolver(transport: Arc<FakeHeadTransport>, batch_size: usize) -> SizeResolver {
        SizeResolver::new(
            transport,
            ResolverConfig {
                batch_size,
                probe_timeout: Duration::from_secs(10),
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_failure_does_not_affect_siblings() {
        let transport = Arc::new(FakeHeadTransport::default());
        let mut urls: Vec<String> = (1..=9).map(|i| format!("https://files.test/f{}", i)).collect();
        urls.insert(4, "https://files.test/down".to_string());

        let sizes = resolver(transport, 10).resolve_sizes(&urls).await;
        assert_eq!(sizes.len(), 10);
        assert_eq!(sizes["https://files.test/down"], 0);
        for i in 1..=9u64 {
            assert_eq!(sizes[&format!("https://files.test/f{}", i)], i * 100);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_batches_bound_concurrency() {
        let transport = Arc::new(FakeHeadTransport::default());
        let urls: Vec<String> = (1..=25).map(|i| format!("https://files.test/f{}", i)).collect();

        let sizes = resolver(transport.clone(), 10).resolve_sizes(&urls).await;
        assert_eq!(sizes.len(), 25);
        assert_eq!(transport.peak.load(Ordering::SeqCst), 10);
        assert_eq!(transport.probed.lock().len(), 25);
    }

    #[tokio::test(start_paused = true)]
    async fn test_degraded_responses_yield_zero() {
        let transport = Arc::new(FakeHeadTransport::default());
        let urls = vec![
            "https://files.test/missing".to_string(),
            "https://files.test/nolength".to_string(),
            "https://files.test/slow".to_string(),
            "not a url".to_string(),
        ];

        let sizes = resolver(transport, 10).resolve_sizes(&urls).await;
        assert!(sizes.values().all(|&size| size == 0));
        assert_eq!(sizes.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_internal_targets_are_not_probed() {
        let transport = Arc::new(FakeHeadTransport::default());
        let urls = vec![
            "http://127.0.0.1/f5".to_string(),
            "http://192.168.1.10/f5".to_string(),
            "https://files.test/f5".to_string(),
        ];

        let sizes = resolver(transport.clone(), 10).resolve_sizes(&urls).await;
        assert_eq!(sizes["http://127.0.0.1/f5"], 0);
        assert_eq!(sizes["http://192.168.1.10/f5"], 0);
        assert_eq!(sizes["https://files.test/f5"], 500);
        assert_eq!(*transport.probed.lock(), vec!["https://files.test/f5".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let transport = Arc::new(FakeHeadTransport::default());
        assert!(resolver(transport, 10).resolve_sizes(&[]).await.is_empty());
    }
}
