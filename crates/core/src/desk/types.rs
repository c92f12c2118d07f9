//! Types shared by the help desk scraper.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vault::CryptoError;

/// Errors that can occur while talking to the help desk.
#[derive(Debug, Clone, Error)]
pub enum DeskError {
    /// Login rejected. Never carries the help desk's own wording.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An established session was refused by an authenticated page.
    #[error("Session rejected by the help desk")]
    SessionRejected,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl DeskError {
    /// Authentication failures, fixed only by new credentials or a new session.
    pub fn is_auth(&self) -> bool {
        matches!(self, DeskError::InvalidCredentials | DeskError::SessionRejected)
    }

    /// Transport failures a caller may retry with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DeskError::ConnectionFailed(_) | DeskError::Timeout | DeskError::Http(_)
        )
    }
}

/// Classify a transport error.
pub(crate) fn transport_error(e: reqwest::Error) -> DeskError {
    if e.is_timeout() {
        DeskError::Timeout
    } else if e.is_connect() {
        DeskError::ConnectionFailed(e.to_string())
    } else {
        DeskError::Http(e.to_string())
    }
}

/// Cookies proving an authenticated help desk session, ready for a `Cookie` header.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(cookies: impl Into<String>) -> Self {
        Self(cookies.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// Help desk account, with its password still encrypted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub base_url: String,
    pub username: String,
    /// `<ivHex>:<cipherHex>` as produced by [`crate::CredentialVault::encrypt`].
    pub encrypted_password: String,
}

impl Credential {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        encrypted_password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            encrypted_password: encrypted_password.into(),
        }
    }
}

/// A ticket scraped from the listing page.
///
/// Absent values are empty strings, never null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRecord {
    pub id: String,
    pub subject: String,
    pub status: String,
    /// Priority label as displayed.
    pub priority: String,
    /// Machine priority code, `"unknown"` when the widget is missing.
    #[serde(rename = "priority_value")]
    pub priority_code: String,
    /// Not shown on the listing page; always empty.
    pub category: String,
    pub room: String,
    #[serde(rename = "name")]
    pub assigned_name: String,
    pub updated_at: String,
    /// Not shown on the listing page; always empty.
    pub created_at: String,
    /// Not shown on the listing page; always empty.
    pub owner: String,
}

/// Tickets returned by one fetch.
#[derive(Debug, Clone, Serialize)]
pub struct TicketBatch {
    pub tickets: Vec<TicketRecord>,
    pub fetched_at: DateTime<Utc>,
}

impl TicketBatch {
    pub fn now(tickets: Vec<TicketRecord>) -> Self {
        Self {
            tickets,
            fetched_at: Utc::now(),
        }
    }
}

/// Outcome of a connection test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTestResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectionTestResult {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: Some(error.into()),
        }
    }
}
