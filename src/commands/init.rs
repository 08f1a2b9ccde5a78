use anyhow::{Context, Result};
use fileharvest::config::{Config, DEFAULT_CONFIG_FILE, PROXY_URL_ENV};
use std::path::{Path, PathBuf};

/// Render the default configuration as a commented TOML document
pub fn default_config_toml() -> String {
    let config = Config::default();

    format!(
        r#"# FileHarvest Configuration

[fetch]
# Proxy endpoint that fetches pages on our behalf; it receives the target
# as a `url` query parameter. Leave unset to scan a built-in sample page.
# Can also be set with {proxy_env}.
# proxy_url = "https://your-project.example/api/scrape"
timeout_secs = {timeout_secs}
max_retries = {max_retries}
retry_base_delay_ms = {retry_base}
retry_max_delay_ms = {retry_max}
cache_ttl_secs = {cache_ttl}
cache_capacity = {cache_capacity}
user_agent = "{user_agent}"

[sizes]
enabled = {sizes_enabled}
batch_size = {batch_size}
probe_timeout_secs = {probe_timeout}

[extractor]
max_name_length = {max_name_length}

[ai]
endpoint = "{ai_endpoint}"
model = "{ai_model}"
# The key is read from this environment variable unless `api_key` is set.
api_key_env = "{api_key_env}"
# api_key = ""
timeout_secs = {ai_timeout}
max_content_chars = {max_content_chars}

[preferences]
# Empty means every category; sizes are in bytes, 0 means no bound.
categories = []
min_size = 0
max_size = 0

[logging]
format = "{log_format}"
level = "{log_level}"
"#,
        proxy_env = PROXY_URL_ENV,
        timeout_secs = config.fetch.timeout_secs,
        max_retries = config.fetch.max_retries,
        retry_base = config.fetch.retry_base_delay_ms,
        retry_max = config.fetch.retry_max_delay_ms,
        cache_ttl = config.fetch.cache_ttl_secs,
        cache_capacity = config.fetch.cache_capacity,
        user_agent = config.fetch.user_agent,
        sizes_enabled = config.sizes.enabled,
        batch_size = config.sizes.batch_size,
        probe_timeout = config.sizes.probe_timeout_secs,
        max_name_length = config.extractor.max_name_length,
        ai_endpoint = config.ai.endpoint,
        ai_model = config.ai.model,
        api_key_env = config.ai.api_key_env,
        ai_timeout = config.ai.timeout_secs,
        max_content_chars = config.ai.max_content_chars,
        log_format = config.logging.format.as_str(),
        log_level = config.logging.level,
    )
}

pub async fn init_config(dir: PathBuf, force: bool) -> Result<()> {
    let config_path = write_default_config(&dir, force)?;
    println!("Created configuration file: {}", config_path.display());
    Ok(())
}

fn write_default_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(DEFAULT_CONFIG_FILE);
    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory '{}'", dir.display()))?;
    std::fs::write(&config_path, default_config_toml())
        .with_context(|| format!("Failed to write '{}'", config_path.display()))?;
    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parses_to_defaults() {
        let parsed = Config::parse(&default_config_toml()).unwrap();
        let defaults = Config::default();

        assert!(parsed.fetch.proxy_url.is_none());
        assert_eq!(parsed.fetch.timeout_secs, defaults.fetch.timeout_secs);
        assert_eq!(parsed.fetch.user_agent, defaults.fetch.user_agent);
        assert_eq!(parsed.sizes.batch_size, defaults.sizes.batch_size);
        assert_eq!(parsed.ai.model, defaults.ai.model);
        assert_eq!(parsed.ai.max_content_chars, defaults.ai.max_content_chars);
        assert_eq!(parsed.logging.level, defaults.logging.level);
        assert!(parsed.preferences.is_unrestricted());
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_default_config(tmp.path(), false).unwrap();
        assert!(path.exists());

        let err = write_default_config(tmp.path(), false).unwrap_err();
        assert!(err.to_string().contains("already exists"));

        assert!(write_default_config(tmp.path(), true).is_ok());
        assert!(Config::load(&path).is_ok());
    }
}
