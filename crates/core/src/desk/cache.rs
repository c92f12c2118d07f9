//! Session reuse across ticket fetches.
//!
//! One slot per credential fingerprint. The slot's async mutex is held for
//! the whole login, so concurrent callers for the same fingerprint wait for
//! the in-flight attempt instead of logging in again.
//!
//! Slots without a live session are dropped once no caller holds them.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info};

use super::{DeskError, SessionToken};

/// Fingerprint of a (base URL, username) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn new(base_url: &str, username: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(base_url.trim_end_matches('/').as_bytes());
        hasher.update([0u8]);
        hasher.update(username.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A session handed out by the cache.
#[derive(Debug, Clone)]
pub struct SessionLease {
    pub token: SessionToken,
    /// True when the token was not produced by this caller's own login.
    pub cached: bool,
}

struct CachedSession {
    token: SessionToken,
    acquired_at: Instant,
}

#[derive(Default)]
struct Slot {
    session: Option<CachedSession>,
    /// Most recent failed login, shared with callers that were already waiting.
    last_failure: Option<(Instant, DeskError)>,
}

impl Slot {
    fn is_live(&self, ttl: Duration) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.acquired_at.elapsed() < ttl)
    }
}

/// TTL-bounded cache of help desk sessions.
pub struct SessionCache {
    ttl: Duration,
    slots: RwLock<HashMap<SessionKey, Arc<Mutex<Slot>>>>,
}

impl SessionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Return a fresh cached session for `key`, or run `login` to get one.
    pub async fn get_or_login<F, Fut>(
        &self,
        key: &SessionKey,
        login: F,
    ) -> Result<SessionLease, DeskError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SessionToken, DeskError>>,
    {
        let arrived_at = Instant::now();
        let handle = self.slot(key).await;
        let mut slot = handle.lock().await;

        if let Some(session) = &slot.session {
            if session.acquired_at.elapsed() < self.ttl {
                debug!(key = key.as_str(), "Reusing cached help desk session");
                return Ok(SessionLease {
                    token: session.token.clone(),
                    cached: true,
                });
            }
            debug!(key = key.as_str(), "Cached help desk session expired");
            slot.session = None;
        }

        if let Some((failed_at, error)) = &slot.last_failure {
            if *failed_at >= arrived_at {
                return Err(error.clone());
            }
        }

        match login().await {
            Ok(token) => {
                info!(key = key.as_str(), "Cached new help desk session");
                slot.session = Some(CachedSession {
                    token: token.clone(),
                    acquired_at: Instant::now(),
                });
                slot.last_failure = None;
                Ok(SessionLease {
                    token,
                    cached: false,
                })
            }
            Err(e) => {
                slot.last_failure = Some((Instant::now(), e.clone()));
                self.release_if_vacant(key, &handle, &slot).await;
                Err(e)
            }
        }
    }

    /// Drop the cached session for `key` if it is still `token`.
    pub async fn invalidate(&self, key: &SessionKey, token: &SessionToken) {
        let handle = {
            let slots = self.slots.read().await;
            match slots.get(key) {
                Some(slot) => Arc::clone(slot),
                None => return,
            }
        };

        let mut slot = handle.lock().await;
        if slot
            .session
            .as_ref()
            .is_some_and(|session| &session.token == token)
        {
            info!(key = key.as_str(), "Invalidated help desk session");
            slot.session = None;
            self.release_if_vacant(key, &handle, &slot).await;
        }
    }

    /// Number of fingerprints holding a live session.
    ///
    /// Slots busy with a login are not counted.
    pub async fn len(&self) -> usize {
        self.slots
            .read()
            .await
            .values()
            .filter(|slot| {
                slot.try_lock()
                    .map(|slot| slot.is_live(self.ttl))
                    .unwrap_or(false)
            })
            .count()
    }

    /// Number of fingerprints tracked, live or not.
    pub async fn slot_count(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn slot(&self, key: &SessionKey) -> Arc<Mutex<Slot>> {
        if let Some(slot) = self.slots.read().await.get(key) {
            return Arc::clone(slot);
        }

        let mut slots = self.slots.write().await;
        if !slots.contains_key(key) {
            let ttl = self.ttl;
            slots.retain(|_, slot| {
                Arc::strong_count(slot) > 1
                    || slot.try_lock().map(|s| s.is_live(ttl)).unwrap_or(true)
            });
        }
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    /// Remove `key`'s slot when it holds no session and nobody else is
    /// waiting on it. `handle` must be the slot `slot` was locked from.
    async fn release_if_vacant(&self, key: &SessionKey, handle: &Arc<Mutex<Slot>>, slot: &Slot) {
        if slot.session.is_some() {
            return;
        }

        let mut slots = self.slots.write().await;
        // One reference in the map, one held by the caller.
        if Arc::strong_count(handle) == 2
            && slots.get(key).is_some_and(|s| Arc::ptr_eq(s, handle))
        {
            debug!(key = key.as_str(), "Released empty session slot");
            slots.remove(key);
        }
    }
}
