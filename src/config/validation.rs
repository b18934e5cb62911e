use crate::config::types::{AdmissionConfig, Config, CrawlConfig, FetcherConfig, ServerConfig};
use crate::ConfigError;
use std::net::SocketAddr;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_admission_config(&config.admission)?;
    validate_server_config(&config.server)?;
    Ok(())
}

/// Validates per-crawl settings, including the seed URL
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    validate_base_url(&config.base_url)?;

    if config.workers < 1 || config.workers > 64 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 64, got {}",
            config.workers
        )));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates the seed URL: present, absolute, http(s), with a host
fn validate_base_url(base_url: &str) -> Result<(), ConfigError> {
    if base_url.trim().is_empty() {
        return Err(ConfigError::Validation(
            "base_url must be set (config file, --base-url or BASE_URL)".to_string(),
        ));
    }

    let url = Url::parse(base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url '{}': {}", base_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base_url '{}' must use the http or https scheme",
            base_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' has no host",
            base_url
        )));
    }

    Ok(())
}

/// Validates fetcher settings
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.connect_timeout_ms == 0 || config.read_timeout_ms == 0 {
        return Err(ConfigError::Validation(format!(
            "fetch timeouts must be greater than 0, got connect={}ms read={}ms",
            config.connect_timeout_ms, config.read_timeout_ms
        )));
    }

    Ok(())
}

/// Validates admission pool sizes
fn validate_admission_config(config: &AdmissionConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_jobs < 1 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_jobs must be >= 1, got {}",
            config.max_concurrent_jobs
        )));
    }

    Ok(())
}

/// Validates the listen address
fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    config.bind.parse::<SocketAddr>().map_err(|e| {
        ConfigError::Validation(format!("Invalid bind address '{}': {}", config.bind, e))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.crawl.base_url = "https://example.com/".to_string();
        config
    }

    #[test]
    fn test_default_config_with_base_url_is_valid() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_base_url() {
        assert!(validate_base_url("https://example.com").is_ok());
        assert!(validate_base_url("http://localhost:8080/start").is_ok());

        assert!(validate_base_url("").is_err());
        assert!(validate_base_url("   ").is_err());
        assert!(validate_base_url("not a url").is_err());
        assert!(validate_base_url("ftp://example.com/").is_err());
        assert!(validate_base_url("/relative/path").is_err());
    }

    #[test]
    fn test_missing_base_url_is_validation_error() {
        let result = validate(&Config::default());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_worker_bounds() {
        let mut config = valid_config();
        config.crawl.workers = 0;
        assert!(validate(&config).is_err());

        config.crawl.workers = 65;
        assert!(validate(&config).is_err());

        config.crawl.workers = 64;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let mut config = valid_config();
        config.crawl.timeout_secs = 0;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.fetcher.read_timeout_ms = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_admission_requires_a_running_slot() {
        let mut config = valid_config();
        config.admission.max_concurrent_jobs = 0;
        assert!(validate(&config).is_err());

        // A zero backlog is allowed: jobs beyond the running slots are rejected
        config.admission.max_concurrent_jobs = 1;
        config.admission.backlog = 0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_bind_address() {
        let mut config = valid_config();
        config.server.bind = "localhost".to_string();
        assert!(validate(&config).is_err());

        config.server.bind = "127.0.0.1:0".to_string();
        assert!(validate(&config).is_ok());
    }
}
