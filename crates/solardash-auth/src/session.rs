//! In-memory session token store
//!
//! Tokens are handed out once an OTP is approved and live until their fixed
//! expiry. Entries are keyed by the SHA-256 hash of the token, so the raw
//! bearer value is never kept in the table. Expired entries are dropped
//! lazily, the next time they are looked up.

use base64::{
    engine::general_purpose::{STANDARD as BASE64, URL_SAFE_NO_PAD},
    Engine as _,
};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Outcome of looking a token up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    /// Issued and not yet expired
    Valid,
    /// Issued but past its expiry; the entry has been evicted
    Expired,
    /// Missing, empty, or never issued
    Invalid,
}

/// Volatile mapping from session token to expiration instant
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, DateTime<Utc>>>>,
}

impl SessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new token that expires `ttl` from now
    pub async fn create(&self, ttl: Duration) -> String {
        self.create_at(Utc::now(), ttl).await
    }

    /// Issue a new token that expires `ttl` after `now`
    ///
    /// An expiry past the representable range saturates to the latest
    /// instant chrono can hold.
    pub async fn create_at(&self, now: DateTime<Utc>, ttl: Duration) -> String {
        let expires_at = now
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut sessions = self.sessions.write().await;

        loop {
            let token = generate_token();
            if let Entry::Vacant(entry) = sessions.entry(hash_token(&token)) {
                entry.insert(expires_at);
                debug!("Issued session token, {} active", sessions.len());
                return token;
            }
        }
    }

    /// Look a token up against the current time
    pub async fn check(&self, token: Option<&str>) -> TokenStatus {
        self.check_at(token, Utc::now()).await
    }

    /// Look a token up against `now`, evicting it if it has expired
    pub async fn check_at(&self, token: Option<&str>, now: DateTime<Utc>) -> TokenStatus {
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => return TokenStatus::Invalid,
        };
        let key = hash_token(token);

        {
            let sessions = self.sessions.read().await;
            match sessions.get(&key) {
                None => return TokenStatus::Invalid,
                Some(expires_at) if now < *expires_at => return TokenStatus::Valid,
                Some(_) => {}
            }
        }

        // Re-check under the write lock; another request may have evicted it.
        let mut sessions = self.sessions.write().await;
        match sessions.get(&key) {
            None => TokenStatus::Invalid,
            Some(expires_at) if now < *expires_at => TokenStatus::Valid,
            Some(_) => {
                sessions.remove(&key);
                debug!("Evicted expired session token");
                TokenStatus::Expired
            }
        }
    }

    /// Remove every expired entry, returning how many were dropped
    pub async fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now()).await
    }

    /// Remove every entry expired at `now`
    pub async fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, expires_at| now < *expires_at);
        before - sessions.len()
    }

    /// Number of stored sessions, expired ones included
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether the store holds no sessions
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Generate a secure random token (256 bits)
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a token for use as a store key
pub(crate) fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let result = hasher.finalize();
    BASE64.encode(result)
}
