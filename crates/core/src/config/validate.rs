use reqwest::Url;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - HTTP timeouts are non-zero and connect <= total
/// - Session TTL is non-zero
/// - Target URL is absolute http(s) and username is set
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.http.connect_timeout_secs == 0 || config.http.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "http timeouts cannot be 0".to_string(),
        ));
    }

    if config.http.connect_timeout_secs > config.http.timeout_secs {
        return Err(ConfigError::ValidationError(
            "http.connect_timeout_secs cannot exceed http.timeout_secs".to_string(),
        ));
    }

    if config.session.ttl_secs == 0 {
        return Err(ConfigError::ValidationError(
            "session.ttl_secs cannot be 0".to_string(),
        ));
    }

    if let Some(target) = &config.target {
        let url = Url::parse(&target.url).map_err(|e| {
            ConfigError::ValidationError(format!("target.url is invalid: {}", e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::ValidationError(format!(
                "target.url must use http or https, got {}",
                url.scheme()
            )));
        }
        if target.username.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "target.username cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}
