//! Fetching, size probing and extraction configuration

use serde::{Deserialize, Serialize};

use super::DEFAULT_USER_AGENT;
use crate::scanning::cache::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL};
use crate::scanning::extractor::DEFAULT_MAX_NAME_LENGTH;

/// Page fetching configuration
///
/// ```toml
/// [fetch]
/// proxy_url = "https://your-project.example/api/scrape"
/// timeout_secs = 30
/// max_retries = 3
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Proxy endpoint taking a `url` query parameter; unset serves a sample page
    pub proxy_url: Option<String>,
    /// Per-attempt timeout (seconds)
    pub timeout_secs: u64,
    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
    /// First backoff delay (milliseconds), doubled per retry
    pub retry_base_delay_ms: u64,
    /// Backoff ceiling (milliseconds)
    pub retry_max_delay_ms: u64,
    /// Page cache TTL (seconds)
    pub cache_ttl_secs: u64,
    /// Maximum cached pages
    pub cache_capacity: usize,
    /// User agent string
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            proxy_url: None,
            timeout_secs: 30,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            retry_max_delay_ms: 10_000,
            cache_ttl_secs: DEFAULT_CACHE_TTL.as_secs(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// File size probing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SizesConfig {
    /// Probe sizes during standard scans
    pub enabled: bool,
    /// Probes in flight at once
    pub batch_size: usize,
    /// Per-probe timeout (seconds)
    pub probe_timeout_secs: u64,
}

impl Default for SizesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            batch_size: 10,
            probe_timeout_secs: 10,
        }
    }
}

/// Reference extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Link or alt text at least this long is ignored for naming
    pub max_name_length: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
        }
    }
}
