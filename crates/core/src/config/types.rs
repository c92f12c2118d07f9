use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::filter::FilterSpec;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub vault: VaultConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub target: Option<TargetConfig>,
}

/// Password vault configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VaultConfig {
    /// Encryption secret. Falls back to `ENCRYPTION_KEY` when unset.
    #[serde(default)]
    pub secret: Option<String>,
}

/// Outbound HTTP configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// TCP connect timeout in seconds (default: 10)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Redirects followed where following is allowed (default: 5)
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            timeout_secs: default_timeout(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_timeout() -> u64 {
    30
}

fn default_max_redirects() -> usize {
    5
}

fn default_user_agent() -> String {
    format!("ticketboard/{}", env!("CARGO_PKG_VERSION"))
}

/// Session cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Seconds a help desk session is reused before logging in again (default: 900)
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: u64,
}

impl SessionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_session_ttl(),
        }
    }
}

fn default_session_ttl() -> u64 {
    900
}

/// Help desk account to scrape
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TargetConfig {
    /// Help desk base URL (e.g., "https://support.example.org")
    pub url: String,
    pub username: String,
    /// Encrypted password (`<ivHex>:<cipherHex>`)
    pub password: String,
    /// Default filters applied when fetching tickets
    #[serde(default)]
    pub filters: FilterSpec,
}

/// Sanitized config for display (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub vault: SanitizedVaultConfig,
    pub http: HttpConfig,
    pub session: SessionConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<SanitizedTargetConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedVaultConfig {
    pub secret_configured: bool,
}

/// Sanitized target config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTargetConfig {
    pub url: String,
    pub username: String,
    pub password_configured: bool,
    pub filters: FilterSpec,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            vault: SanitizedVaultConfig {
                secret_configured: config
                    .vault
                    .secret
                    .as_ref()
                    .is_some_and(|s| !s.is_empty()),
            },
            http: config.http.clone(),
            session: config.session.clone(),
            target: config.target.as_ref().map(|t| SanitizedTargetConfig {
                url: t.url.clone(),
                username: t.username.clone(),
                password_configured: !t.password.is_empty(),
                filters: t.filters.clone(),
            }),
        }
    }
}
