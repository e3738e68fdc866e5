use crate::config::types::{Config, RetryConfig, SessionConfig, SiteConfig};
use crate::retry::MAX_BACKOFF;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_session_config(&config.session)?;
    validate_site_config(&config.site)?;
    validate_retry_config(&config.retry)?;
    Ok(())
}

/// Validates session configuration
fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min_delay_ms ({}) must not exceed max_delay_ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the target site
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    match url.scheme() {
        "https" => {}
        "http" if !config.https_only => {}
        "http" => {
            return Err(ConfigError::Validation(format!(
                "base_url '{}' must use HTTPS while https_only is set",
                config.base_url
            )))
        }
        other => {
            return Err(ConfigError::InvalidUrl(format!(
                "Unsupported scheme '{}' in base_url",
                other
            )))
        }
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' has no host",
            config.base_url
        )));
    }

    Ok(())
}

/// Validates retry configuration
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if !(1.0..=MAX_BACKOFF).contains(&config.backoff) {
        return Err(ConfigError::Validation(format!(
            "backoff must be between 1.0 and {}, got {}",
            MAX_BACKOFF, config.backoff
        )));
    }

    if let Some(code) = config
        .retry_codes
        .iter()
        .find(|code| !(100..=599).contains(*code))
    {
        return Err(ConfigError::Validation(format!(
            "retry code {} is not an HTTP status",
            code
        )));
    }

    Ok(())
}
