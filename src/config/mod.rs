//! Configuration for FileHarvest

mod ai;
mod fetch;
mod logging;

pub use ai::AiConfig;
pub use fetch::{ExtractorConfig, FetchConfig, SizesConfig};
pub use logging::{LogFormat, LogLevel, LoggingConfig};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

use crate::types::ScanPreferences;

/// Default user agent for proxy requests and size probes
pub const DEFAULT_USER_AGENT: &str = "FileHarvest/0.1 (+https://github.com/fileharvest/fileharvest)";

/// Environment variable that overrides `fetch.proxy_url`
pub const PROXY_URL_ENV: &str = "FILEHARVEST_PROXY_URL";

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "fileharvest.toml";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Page fetching
    pub fetch: FetchConfig,
    /// File size probing
    pub sizes: SizesConfig,
    /// Reference extraction
    pub extractor: ExtractorConfig,
    /// Generative AI scan
    pub ai: AiConfig,
    /// Default scan preferences
    pub preferences: ScanPreferences,
    /// Logging
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file, apply environment overrides and
    /// validate the result.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        let mut config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise start from defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML without validation
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.override_proxy_url(std::env::var(PROXY_URL_ENV).ok());
    }

    fn override_proxy_url(&mut self, value: Option<String>) {
        if let Some(proxy) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            tracing::debug!("Using proxy URL from {}", PROXY_URL_ENV);
            self.fetch.proxy_url = Some(proxy);
        }
    }

    /// Validate all configuration fields.
    ///
    /// Every problem is collected and reported in one error.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        // Fetch validation
        if self.fetch.timeout_secs == 0 {
            errors.push("fetch.timeout_secs must be positive".to_string());
        }
        if self.fetch.cache_capacity == 0 {
            errors.push("fetch.cache_capacity must be positive".to_string());
        }
        if self.fetch.retry_base_delay_ms > self.fetch.retry_max_delay_ms {
            errors.push(format!(
                "fetch.retry_base_delay_ms ({}) must not exceed fetch.retry_max_delay_ms ({})",
                self.fetch.retry_base_delay_ms, self.fetch.retry_max_delay_ms
            ));
        }
        if let Some(proxy) = self.fetch.proxy_url.as_deref().map(str::trim) {
            if !proxy.is_empty() {
                match Url::parse(proxy) {
                    Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                    Ok(url) => errors.push(format!(
                        "fetch.proxy_url must use http or https, got '{}'",
                        url.scheme()
                    )),
                    Err(e) => errors.push(format!("fetch.proxy_url is not a valid URL: {}", e)),
                }
            }
        }

        // Size probe validation
        if self.sizes.batch_size == 0 {
            errors.push("sizes.batch_size must be positive".to_string());
        }
        if self.sizes.probe_timeout_secs == 0 {
            errors.push("sizes.probe_timeout_secs must be positive".to_string());
        }

        // Extractor validation
        if self.extractor.max_name_length == 0 {
            errors.push("extractor.max_name_length must be positive".to_string());
        }

        // AI validation
        if self.ai.timeout_secs == 0 {
            errors.push("ai.timeout_secs must be positive".to_string());
        }
        if self.ai.model.trim().is_empty() {
            errors.push("ai.model must not be empty".to_string());
        }
        if Url::parse(&self.ai.endpoint).is_err() {
            errors.push(format!("ai.endpoint is not a valid URL: '{}'", self.ai.endpoint));
        }
        if self.ai.max_content_chars == 0 {
            errors.push("ai.max_content_chars must be positive".to_string());
        }

        // Preference validation
        let prefs = &self.preferences;
        if prefs.min_size > 0 && prefs.max_size > 0 && prefs.min_size > prefs.max_size {
            errors.push(format!(
                "preferences.min_size ({}) must not exceed preferences.max_size ({})",
                prefs.min_size, prefs.max_size
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    // ========================================================================
    // Config::validate
    // ========================================================================

    #[test]
    fn test_default_config_passes_validation() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut cfg = Config::default();
        cfg.fetch.timeout_secs = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("fetch.timeout_secs must be positive"));
    }

    #[test]
    fn test_validate_rejects_zero_batch_size() {
        let mut cfg = Config::default();
        cfg.sizes.batch_size = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("sizes.batch_size must be positive"));
    }

    #[test]
    fn test_validate_rejects_inverted_backoff() {
        let mut cfg = Config::default();
        cfg.fetch.retry_base_delay_ms = 20_000;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("retry_base_delay_ms"));
    }

    #[test]
    fn test_validate_rejects_non_http_proxy() {
        let mut cfg = Config::default();
        cfg.fetch.proxy_url = Some("ftp://proxy.test/".to_string());
        assert!(cfg.validate().unwrap_err().to_string().contains("http or https"));

        cfg.fetch.proxy_url = Some("::nope".to_string());
        assert!(cfg.validate().unwrap_err().to_string().contains("not a valid URL"));

        cfg.fetch.proxy_url = Some(String::new());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_size_bounds() {
        let mut cfg = Config::default();
        cfg.preferences = ScanPreferences::new().with_size_bounds(2000, 1000);
        assert!(cfg.validate().unwrap_err().to_string().contains("preferences.min_size"));

        cfg.preferences = ScanPreferences::new().with_size_bounds(2000, 0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_collects_multiple_errors() {
        let mut cfg = Config::default();
        cfg.fetch.timeout_secs = 0;
        cfg.sizes.batch_size = 0;
        cfg.extractor.max_name_length = 0;
        let msg = cfg.validate().unwrap_err().to_string();
        assert!(msg.contains("fetch.timeout_secs must be positive"));
        assert!(msg.contains("sizes.batch_size must be positive"));
        assert!(msg.contains("extractor.max_name_length must be positive"));
    }

    // ========================================================================
    // Parsing and loading
    // ========================================================================

    #[test]
    fn test_default_values() {
        let cfg = Config::default();
        assert!(cfg.fetch.proxy_url.is_none());
        assert_eq!(cfg.fetch.timeout_secs, 30);
        assert_eq!(cfg.fetch.max_retries, 3);
        assert_eq!(cfg.fetch.cache_ttl_secs, 300);
        assert_eq!(cfg.sizes.batch_size, 10);
        assert!(cfg.sizes.enabled);
        assert_eq!(cfg.extractor.max_name_length, 100);
        assert_eq!(cfg.ai.model, "gemini-2.5-flash");
        assert_eq!(cfg.ai.api_key_env, "GEMINI_API_KEY");
        assert!(cfg.preferences.is_unrestricted());
    }

    #[test]
    fn test_parse_partial_file() {
        let cfg = Config::parse(
            r#"
            [fetch]
            proxy_url = "https://proxy.test/api/scrape"
            max_retries = 5

            [preferences]
            categories = ["Image", "Video"]
            min_size = 1024
            "#,
        )
        .unwrap();

        assert_eq!(cfg.fetch.proxy_url.as_deref(), Some("https://proxy.test/api/scrape"));
        assert_eq!(cfg.fetch.max_retries, 5);
        assert_eq!(cfg.fetch.timeout_secs, 30);
        assert!(cfg.preferences.categories.contains(&Category::Video));
        assert_eq!(cfg.preferences.min_size, 1024);
        assert_eq!(cfg.sizes.batch_size, 10);
    }

    #[test]
    fn test_load_reports_path_on_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.toml");
        std::fs::write(&path, "[fetch\ntimeout_secs = ").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.toml"));
    }

    #[test]
    fn test_load_validates() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[sizes]\nbatch_size = 0\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("sizes.batch_size must be positive"));
    }

    #[test]
    fn test_load_or_default_without_file() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = Config::load_or_default(&tmp.path().join("missing.toml")).unwrap();
        assert_eq!(cfg.fetch.timeout_secs, 30);
    }

    #[test]
    fn test_proxy_override_replaces_configured_value() {
        let mut cfg = Config::default();
        cfg.fetch.proxy_url = Some("https://from-file.test/".to_string());

        cfg.override_proxy_url(Some("  ".to_string()));
        assert_eq!(cfg.fetch.proxy_url.as_deref(), Some("https://from-file.test/"));

        cfg.override_proxy_url(Some(" https://from-env.test/scrape ".to_string()));
        assert_eq!(cfg.fetch.proxy_url.as_deref(), Some("https://from-env.test/scrape"));
    }
}
