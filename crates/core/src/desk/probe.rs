//! Connection diagnostics.

use reqwest::header::COOKIE;
use reqwest::StatusCode;
use tracing::{debug, info};

use super::http::{desk_url, DeskHttp, LISTING_PATH};
use super::{transport_error, ConnectionTestResult, DeskError, SessionAuthenticator};

pub const SUCCESS_MESSAGE: &str = "Connexion réussie";
pub const FAILURE_MESSAGE: &str = "Échec de la connexion";
pub const ADMIN_UNREACHABLE: &str = "Impossible d'accéder à l'interface admin";

/// Validates a credential set without retrieving tickets.
#[derive(Clone)]
pub struct ConnectionTester {
    authenticator: SessionAuthenticator,
    http: DeskHttp,
}

impl ConnectionTester {
    pub fn new(authenticator: SessionAuthenticator, http: DeskHttp) -> Self {
        Self {
            authenticator,
            http,
        }
    }

    /// Log in and open the admin page. Never fails: every problem is
    /// reported in the result.
    pub async fn test(&self, base_url: &str, username: &str, password: &str) -> ConnectionTestResult {
        match self.probe(base_url, username, password).await {
            Ok(()) => {
                info!(url = base_url, "Help desk connection test succeeded");
                ConnectionTestResult::succeeded(SUCCESS_MESSAGE)
            }
            Err(DeskError::SessionRejected) => {
                info!(url = base_url, "Help desk login worked but the admin page did not");
                ConnectionTestResult::failed(FAILURE_MESSAGE, ADMIN_UNREACHABLE)
            }
            Err(e) => {
                info!(url = base_url, error = %e, "Help desk connection test failed");
                ConnectionTestResult::failed(FAILURE_MESSAGE, e.to_string())
            }
        }
    }

    async fn probe(&self, base_url: &str, username: &str, password: &str) -> Result<(), DeskError> {
        let session = self.authenticator.login(base_url, username, password).await?;

        let response = self
            .http
            .following()
            .get(desk_url(base_url, LISTING_PATH))
            .header(COOKIE, session.as_str())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        debug!(status = %status, "Admin page fetched");

        // Landing back on a login page, even with a 200, means the session was refused.
        if status == StatusCode::OK && !body.contains("login") {
            Ok(())
        } else {
            Err(DeskError::SessionRejected)
        }
    }
}
