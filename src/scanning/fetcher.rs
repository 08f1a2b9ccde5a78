//! Content fetcher shared by both scan paths
//!
//! A fetch runs these steps in order:
//! 1. validate the target (http(s) only, no internal addresses)
//! 2. return a fresh cached copy if one exists
//! 3. with no proxy configured, return a fixed placeholder page
//! 4. otherwise GET `<proxy>?url=<target>`, bounded by a timeout
//! 5. retry transient failures with exponential backoff
//! 6. cache the body under the target URL
//!
//! Metrics are recorded by the scanners, never here.

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::cache::ContentCache;
use super::error::ScanError;
use super::transport::{HttpTransport, TransportError, TransportResponse};
use super::validate::validate_target;
use crate::util::truncate_str;

/// Page served when no proxy is configured
pub const PLACEHOLDER_PAGE: &str = r#"<html>
  <body>
    <h1>Sample Files Page</h1>
    <p>No proxy is configured, so this sample page is shown instead of live content.</p>
    <a href="https://example.com/files/image.jpg">Download JPG Image</a>
    <a href="/files/document.pdf">Important Document (PDF)</a>
    <img src="https://example.com/files/photo.png" alt="A nice photo" />
    <a href="https://example.com/archive.zip">Download ZIP Archive</a>
    <a href="https://example.com/data.json">Some JSON data</a>
    <video controls src="https://example.com/video.mp4"></video>
    <audio controls src="https://example.com/audio.mp3"></audio>
  </body>
</html>
"#;

/// Runtime settings for the content fetcher
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Proxy endpoint; `None` serves [`PLACEHOLDER_PAGE`]
    pub proxy_url: Option<Url>,
    /// Wall-clock bound for a single attempt
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub retry_base_delay: Duration,
    /// Upper bound for any backoff delay
    pub retry_max_delay: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            proxy_url: None,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(1000),
            retry_max_delay: Duration::from_millis(10_000),
        }
    }
}

impl FetcherConfig {
    /// Backoff before retry number `attempt` (0-based): base * 2^attempt, capped
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.retry_base_delay
            .saturating_mul(factor)
            .min(self.retry_max_delay)
    }
}

/// Error body returned by the proxy on failure
#[derive(Debug, Deserialize)]
struct ProxyErrorBody {
    message: Option<String>,
}

/// Fetches page content through the proxy with caching and retries
#[derive(Debug, Clone)]
pub struct ContentFetcher {
    transport: Arc<dyn HttpTransport>,
    cache: Arc<ContentCache>,
    config: FetcherConfig,
}

impl ContentFetcher {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        cache: Arc<ContentCache>,
        config: FetcherConfig,
    ) -> Self {
        Self {
            transport,
            cache,
            config,
        }
    }

    pub fn cache(&self) -> &Arc<ContentCache> {
        &self.cache
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Fetch the raw text of `target`
    pub async fn fetch(&self, target: &str) -> Result<String, ScanError> {
        let target = validate_target(target)?;
        let key = target.as_str();

        if let Some(content) = self.cache.get(key) {
            tracing::debug!("Cache hit for {}", key);
            return Ok(content);
        }

        let Some(proxy) = &self.config.proxy_url else {
            tracing::warn!("No proxy configured, serving placeholder page for {}", key);
            return Ok(PLACEHOLDER_PAGE.to_string());
        };

        let request_url = proxy_request_url(proxy, &target);
        let content = self.fetch_with_retry(&request_url).await?;

        tracing::debug!("Fetched {} bytes from {}", content.len(), key);
        self.cache.insert(key, content.clone());
        Ok(content)
    }

    async fn fetch_with_retry(&self, request_url: &Url) -> Result<String, ScanError> {
        let mut attempt = 0u32;
        loop {
            match self.fetch_once(request_url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.config.backoff_delay(attempt);
                    attempt += 1;
                    tracing::warn!(
                        "Fetch attempt {} of {} failed ({}), retrying in {:?}",
                        attempt,
                        self.config.max_retries + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, request_url: &Url) -> Result<String, ScanError> {
        let timeout = self.config.timeout;
        let response = match tokio::time::timeout(timeout, self.transport.get(request_url)).await {
            Err(_) | Ok(Err(TransportError::Timeout)) => return Err(ScanError::Timeout(timeout)),
            Ok(Err(e)) => {
                return Err(ScanError::proxy(
                    None,
                    format!("cannot reach proxy server: {}", e),
                ))
            }
            Ok(Ok(response)) => response,
        };

        if !response.is_success() {
            return Err(ScanError::proxy(
                Some(response.status),
                proxy_error_message(&response),
            ));
        }

        Ok(response.body)
    }
}

/// `<proxy>?url=<target>`, keeping any query the proxy URL already has
pub fn proxy_request_url(proxy: &Url, target: &Url) -> Url {
    let mut url = proxy.clone();
    url.query_pairs_mut().append_pair("url", target.as_str());
    url
}

/// Prefer the proxy's `{message}` field, then a short body excerpt
fn proxy_error_message(response: &TransportResponse) -> String {
    if let Ok(ProxyErrorBody { message: Some(msg) }) = serde_json::from_str(&response.body) {
        if !msg.trim().is_empty() {
            return msg;
        }
    }

    let body = response.body.trim();
    if body.is_empty() {
        format!("proxy returned status {}", response.status)
    } else {
        truncate_str(body, 200)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays scripted GET outcomes; the last one repeats once the script runs out
    #[derive(Debug)]
    struct ScriptedTransport {
        script: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
        last: Mutex<Option<Result<TransportResponse, TransportError>>>,
        calls: AtomicUsize,
        requested: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<TransportResponse, TransportError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                last: Mutex::new(None),
                calls: AtomicUsize::new(0),
                requested: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn get(&self, url: &Url) -> Result<TransportResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requested.lock().push(url.to_string());
            let next = self.script.lock().pop_front();
            match next {
                Some(outcome) => {
                    *self.last.lock() = Some(outcome.clone());
                    outcome
                }
                None => self
                    .last
                    .lock()
                    .clone()
                    .unwrap_or_else(|| Err(TransportError::Other("empty script".into()))),
            }
        }

        async fn head(&self, _url: &Url) -> Result<TransportResponse, TransportError> {
            Err(TransportError::Other("HEAD not scripted".into()))
        }
    }

    /// Never answers, so only the fetcher timeout can end the call
    #[derive(Debug, Default)]
    struct HangingTransport {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HttpTransport for HangingTransport {
        async fn get(&self, _url: &Url) -> Result<TransportResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }

        async fn head(&self, _url: &Url) -> Result<TransportResponse, TransportError> {
            std::future::pending().await
        }
    }

    fn proxied_config() -> FetcherConfig {
        FetcherConfig {
            proxy_url: Some(Url::parse("https://proxy.test/api/scrape").unwrap()),
            ..FetcherConfig::default()
        }
    }

    fn fetcher(transport: Arc<dyn HttpTransport>, config: FetcherConfig) -> ContentFetcher {
        ContentFetcher::new(transport, Arc::new(ContentCache::default()), config)
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = FetcherConfig::default();
        assert_eq!(config.backoff_delay(0), Duration::from_secs(1));
        assert_eq!(config.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(config.backoff_delay(2), Duration::from_secs(4));
        assert_eq!(config.backoff_delay(4), Duration::from_secs(10));
        assert_eq!(config.backoff_delay(40), Duration::from_secs(10));
    }

    #[test]
    fn test_proxy_request_url_encodes_target() {
        let proxy = Url::parse("https://proxy.test/api/scrape").unwrap();
        let target = Url::parse("https://site.test/a b?x=1&y=2").unwrap();
        let url = proxy_request_url(&proxy, &target);

        let (key, value) = url.query_pairs().next().unwrap();
        assert_eq!(key, "url");
        assert_eq!(value, target.as_str());
        assert_eq!(url.query_pairs().count(), 1);
    }

    #[tokio::test]
    async fn test_placeholder_without_proxy() {
        let transport = ScriptedTransport::new(vec![]);
        let fetcher = fetcher(transport.clone(), FetcherConfig::default());

        let body = fetcher.fetch("https://example.com/page").await.unwrap();
        assert_eq!(body, PLACEHOLDER_PAGE);
        assert_eq!(transport.calls(), 0);
        assert!(fetcher.cache().is_empty());
    }

    #[tokio::test]
    async fn test_validation_happens_before_network() {
        let transport = ScriptedTransport::new(vec![Ok(TransportResponse::ok("never"))]);
        let fetcher = fetcher(transport.clone(), proxied_config());

        let err = fetcher.fetch("http://10.1.2.3/").await.unwrap_err();
        assert!(matches!(err, ScanError::Validation(_)));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_second_fetch_is_served_from_cache() {
        let transport = ScriptedTransport::new(vec![Ok(TransportResponse::ok("<html>1</html>"))]);
        let fetcher = fetcher(transport.clone(), proxied_config());

        let first = fetcher.fetch("https://site.test/page").await.unwrap();
        let second = fetcher.fetch("https://site.test/page").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(transport.calls(), 1);
        assert_eq!(
            transport.requested.lock()[0],
            "https://proxy.test/api/scrape?url=https%3A%2F%2Fsite.test%2Fpage"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_failures() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Connect("refused".into())),
            Ok(TransportResponse::with_status(503, "")),
            Ok(TransportResponse::ok("finally")),
        ]);
        let fetcher = fetcher(transport.clone(), proxied_config());

        let body = fetcher.fetch("https://site.test/").await.unwrap();
        assert_eq!(body, "finally");
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_ceiling() {
        let transport = ScriptedTransport::new(vec![Ok(TransportResponse::with_status(502, ""))]);
        let fetcher = fetcher(transport.clone(), proxied_config());

        let err = fetcher.fetch("https://site.test/").await.unwrap_err();
        assert!(matches!(err, ScanError::Proxy { status: Some(502), .. }));
        assert_eq!(transport.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_errors_are_not_retried() {
        let transport = ScriptedTransport::new(vec![Ok(TransportResponse::with_status(
            404,
            r#"{"message":"Target page not found"}"#,
        ))]);
        let fetcher = fetcher(transport.clone(), proxied_config());

        let err = fetcher.fetch("https://site.test/missing").await.unwrap_err();
        assert_eq!(transport.calls(), 1);
        assert_eq!(err.to_string(), "Proxy error (404): Target page not found");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_retried_then_reported() {
        let transport = Arc::new(HangingTransport::default());
        let config = FetcherConfig {
            max_retries: 2,
            ..proxied_config()
        };
        let fetcher = fetcher(transport.clone(), config);

        let err = fetcher.fetch("https://slow.test/").await.unwrap_err();
        assert!(matches!(err, ScanError::Timeout(d) if d == Duration::from_secs(30)));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_is_not_cached() {
        let transport = ScriptedTransport::new(vec![
            Ok(TransportResponse::with_status(400, "")),
            Ok(TransportResponse::ok("ok")),
        ]);
        let fetcher = fetcher(transport.clone(), proxied_config());

        assert!(fetcher.fetch("https://site.test/").await.is_err());
        assert!(fetcher.cache().is_empty());
        assert_eq!(fetcher.fetch("https://site.test/").await.unwrap(), "ok");
    }

    #[test]
    fn test_proxy_error_message_fallbacks() {
        let json = TransportResponse::with_status(500, r#"{"message":"boom"}"#);
        assert_eq!(proxy_error_message(&json), "boom");

        let empty = TransportResponse::with_status(500, "");
        assert_eq!(proxy_error_message(&empty), "proxy returned status 500");

        let text = TransportResponse::with_status(500, "Internal Server Error");
        assert_eq!(proxy_error_message(&text), "Internal Server Error");
    }
}
