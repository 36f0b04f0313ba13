//! Request authorization against the session store

use crate::session::{SessionStore, TokenStatus};
use tracing::debug;

/// Why a request was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDenial {
    /// The token was issued but has expired
    SessionTimedOut,
    /// No token, or one this server never issued
    NotAuthorized,
}

impl AuthDenial {
    /// Message shown to the client
    pub fn message(&self) -> &'static str {
        match self {
            AuthDenial::SessionTimedOut => "Your session has timed out. Please log in again.",
            AuthDenial::NotAuthorized => "You are not authorized",
        }
    }
}

impl std::fmt::Display for AuthDenial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Result of an authorization check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthResult {
    pub authorized: bool,
    pub reason: Option<AuthDenial>,
}

impl AuthResult {
    fn allowed() -> Self {
        Self {
            authorized: true,
            reason: None,
        }
    }

    fn denied(reason: AuthDenial) -> Self {
        Self {
            authorized: false,
            reason: Some(reason),
        }
    }
}

impl From<TokenStatus> for AuthResult {
    fn from(status: TokenStatus) -> Self {
        match status {
            TokenStatus::Valid => AuthResult::allowed(),
            TokenStatus::Expired => AuthResult::denied(AuthDenial::SessionTimedOut),
            TokenStatus::Invalid => AuthResult::denied(AuthDenial::NotAuthorized),
        }
    }
}

/// Classify a raw `Authorization` header value
pub async fn authorize(store: &SessionStore, token: Option<&str>) -> AuthResult {
    let result = AuthResult::from(store.check(token).await);
    if let Some(reason) = result.reason {
        debug!("Request denied: {:?}", reason);
    }
    result
}
