//! Help desk client: the entry point used by callers.

use std::sync::Arc;

use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::config::{HttpConfig, SessionConfig};
use crate::filter::FilterSpec;
use crate::vault::{CredentialVault, CryptoError};

use super::cache::{SessionCache, SessionKey, SessionLease};
use super::{
    ConnectionTestResult, ConnectionTester, Credential, DeskError, DeskHttp,
    SessionAuthenticator, TicketBatch, TicketExtractor, TicketRecord,
};

/// Scrapes tickets for any number of help desk accounts, reusing sessions.
pub struct HelpdeskClient {
    vault: Arc<CredentialVault>,
    authenticator: SessionAuthenticator,
    extractor: TicketExtractor,
    tester: ConnectionTester,
    sessions: SessionCache,
}

impl HelpdeskClient {
    pub fn new(
        http: &HttpConfig,
        session: &SessionConfig,
        vault: Arc<CredentialVault>,
    ) -> Result<Self, DeskError> {
        let http = DeskHttp::new(http)?;
        let authenticator = SessionAuthenticator::new(http.clone());

        Ok(Self {
            vault,
            extractor: TicketExtractor::new(http.clone()),
            tester: ConnectionTester::new(authenticator.clone(), http),
            authenticator,
            sessions: SessionCache::new(session.ttl()),
        })
    }

    /// Fetch the tickets of `credential` matching `filter`.
    ///
    /// A cached session refused by the listing page is dropped and replaced
    /// by one fresh login before giving up.
    pub async fn fetch_tickets(
        &self,
        credential: &Credential,
        filter: &FilterSpec,
    ) -> Result<TicketBatch, DeskError> {
        let password = Zeroizing::new(self.vault.decrypt(&credential.encrypted_password)?);
        let key = SessionKey::new(&credential.base_url, &credential.username);

        let lease = self.session(&key, credential, &password).await?;
        match self.list(&key, credential, &lease, filter).await {
            Err(DeskError::SessionRejected) if lease.cached => {
                warn!(
                    url = %credential.base_url,
                    "Cached help desk session rejected, logging in again"
                );
                let lease = self.session(&key, credential, &password).await?;
                let tickets = self.list(&key, credential, &lease, filter).await?;
                Ok(TicketBatch::now(tickets))
            }
            result => Ok(TicketBatch::now(result?)),
        }
    }

    /// Check a plaintext credential set without fetching tickets.
    pub async fn test_connection(
        &self,
        base_url: &str,
        username: &str,
        password: &str,
    ) -> ConnectionTestResult {
        self.tester.test(base_url, username, password).await
    }

    /// Encrypt a help desk password for storage.
    pub fn encrypt_password(&self, plaintext: &str) -> Result<String, CryptoError> {
        self.vault.encrypt(plaintext)
    }

    pub fn sessions(&self) -> &SessionCache {
        &self.sessions
    }

    async fn session(
        &self,
        key: &SessionKey,
        credential: &Credential,
        password: &str,
    ) -> Result<SessionLease, DeskError> {
        self.sessions
            .get_or_login(key, || {
                self.authenticator
                    .login(&credential.base_url, &credential.username, password)
            })
            .await
    }

    async fn list(
        &self,
        key: &SessionKey,
        credential: &Credential,
        lease: &SessionLease,
        filter: &FilterSpec,
    ) -> Result<Vec<TicketRecord>, DeskError> {
        let result = self
            .extractor
            .list_tickets(&credential.base_url, &lease.token, filter)
            .await;

        if let Err(e) = &result {
            if e.is_auth() {
                debug!(error = %e, "Dropping help desk session after auth failure");
                self.sessions.invalidate(key, &lease.token).await;
            }
        }
        result
    }
}
