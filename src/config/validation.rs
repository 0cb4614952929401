use crate::config::types::{
    Config, DelayRange, DiscoveryConfig, PacingConfig, RetryConfig, SessionConfig, SiteConfig,
};
use crate::ConfigError;
use std::collections::BTreeMap;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_session_config(&config.session)?;
    validate_pacing_config(&config.pacing)?;
    validate_discovery_config(&config.discovery)?;
    validate_retry_config(&config.retry)?;
    validate_providers(&config.providers)?;

    if config.extraction.workers < 1 || config.extraction.workers > 32 {
        return Err(ConfigError::Validation(format!(
            "extraction workers must be between 1 and 32, got {}",
            config.extraction.workers
        )));
    }

    if config.output.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if !config.search_path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "search-path must start with '/', got '{}'",
            config.search_path
        )));
    }

    if config.challenge_markers.iter().any(|m| m.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "challenge-markers cannot contain empty entries".to_string(),
        ));
    }

    Ok(())
}

fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.plain_timeout_secs == 0 || config.bypass_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request timeouts must be at least one second".to_string(),
        ));
    }

    if config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "connect-timeout-secs must be at least one second".to_string(),
        ));
    }

    if let Some(proxy) = &config.proxy {
        Url::parse(proxy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", proxy, e)))?;
    }

    Ok(())
}

fn validate_pacing_config(config: &PacingConfig) -> Result<(), ConfigError> {
    for (name, range) in [
        ("warm-up", &config.warm_up),
        ("between-pages", &config.between_pages),
        ("after-empty-page", &config.after_empty_page),
        ("after-failure", &config.after_failure),
        ("challenge-wait", &config.challenge_wait),
        ("between-records", &config.between_records),
    ] {
        validate_range(name, range)?;
    }
    Ok(())
}

fn validate_discovery_config(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.failure_threshold < 1 {
        return Err(ConfigError::Validation(format!(
            "failure-threshold must be >= 1, got {}",
            config.failure_threshold
        )));
    }

    Ok(())
}

fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    validate_range("backoff", &config.backoff)?;
    validate_range("blocked-backoff", &config.blocked_backoff)?;

    Ok(())
}

fn validate_providers(providers: &BTreeMap<String, String>) -> Result<(), ConfigError> {
    for (key, term) in providers {
        if key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "provider keys cannot be empty".to_string(),
            ));
        }

        if term.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "provider '{}' has an empty search term",
                key
            )));
        }
    }
    Ok(())
}

/// A delay range must have its bounds in order
fn validate_range(name: &str, range: &DelayRange) -> Result<(), ConfigError> {
    if range.min_ms > range.max_ms {
        return Err(ConfigError::Validation(format!(
            "{}: min-ms ({}) is greater than max-ms ({})",
            name, range.min_ms, range.max_ms
        )));
    }
    Ok(())
}
