//! OTP login flow
//!
//! The pending/approved state of each phone number lives entirely with the
//! verification provider. This module only validates input, forwards the
//! send and check calls, and opens a session once the provider approves.

use crate::session::SessionStore;
use async_trait::async_trait;
use chrono::Duration;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Provider status that completes a login
pub const STATUS_APPROVED: &str = "approved";

/// Delivery channel for a verification code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Sms,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Sms => "sms",
        }
    }
}

/// Failure reported by a verification provider
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ProviderError(pub String);

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// External service that sends and checks one-time codes
#[async_trait]
pub trait VerificationProvider: Send + Sync {
    /// Start a verification, returning the provider's status string
    async fn start_verification(
        &self,
        phone_number: &str,
        channel: Channel,
    ) -> Result<String, ProviderError>;

    /// Check a submitted code, returning the provider's status string
    async fn check_verification(
        &self,
        phone_number: &str,
        code: &str,
    ) -> Result<String, ProviderError>;
}

/// OTP flow errors
#[derive(Debug, Error)]
pub enum OtpError {
    #[error("Phone number is required")]
    MissingPhoneNumber,
    #[error("Phone number and OTP are required")]
    MissingFields,
    #[error("{0}")]
    Provider(#[from] ProviderError),
}

impl OtpError {
    /// Whether the caller sent bad input (as opposed to an upstream failure)
    pub fn is_client_error(&self) -> bool {
        matches!(self, OtpError::MissingPhoneNumber | OtpError::MissingFields)
    }
}

pub type OtpResult<T> = Result<T, OtpError>;

/// A code was sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpSent {
    /// Provider status, normally `pending`
    pub status: String,
}

/// Outcome of checking a code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpOutcome {
    /// Code accepted and a session opened
    Approved { session_token: String },
    /// Code rejected; no session was created
    Denied,
}

/// Drives send/verify against a provider and opens sessions
#[derive(Clone)]
pub struct OtpFlow {
    provider: Arc<dyn VerificationProvider>,
    sessions: SessionStore,
    session_ttl: Duration,
}

impl OtpFlow {
    pub fn new(
        provider: Arc<dyn VerificationProvider>,
        sessions: SessionStore,
        session_ttl: Duration,
    ) -> Self {
        Self {
            provider,
            sessions,
            session_ttl,
        }
    }

    /// Session store that approved logins are written to
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Send a code to `phone_number` over SMS
    ///
    /// Surrounding whitespace is trimmed before the number is checked and
    /// forwarded to the provider.
    pub async fn initiate_otp(&self, phone_number: Option<&str>) -> OtpResult<OtpSent> {
        let phone_number = non_empty(phone_number).ok_or(OtpError::MissingPhoneNumber)?;

        let status = self
            .provider
            .start_verification(phone_number, Channel::Sms)
            .await
            .map_err(|e| {
                warn!("Failed to send OTP to {}: {}", mask_phone(phone_number), e);
                e
            })?;

        info!("OTP sent to {} ({})", mask_phone(phone_number), status);
        Ok(OtpSent { status })
    }

    /// Check `code` for `phone_number`, opening a session when approved
    ///
    /// Both values are trimmed the same way as in `initiate_otp`.
    pub async fn complete_otp(
        &self,
        phone_number: Option<&str>,
        code: Option<&str>,
    ) -> OtpResult<OtpOutcome> {
        let (phone_number, code) = match (non_empty(phone_number), non_empty(code)) {
            (Some(p), Some(c)) => (p, c),
            _ => return Err(OtpError::MissingFields),
        };

        let status = self
            .provider
            .check_verification(phone_number, code)
            .await
            .map_err(|e| {
                warn!("Failed to verify OTP for {}: {}", mask_phone(phone_number), e);
                e
            })?;

        if status != STATUS_APPROVED {
            info!("OTP denied for {} ({})", mask_phone(phone_number), status);
            return Ok(OtpOutcome::Denied);
        }

        let session_token = self.sessions.create(self.session_ttl).await;
        info!("OTP approved for {}, session opened", mask_phone(phone_number));
        Ok(OtpOutcome::Approved { session_token })
    }
}

/// Trim `value`, treating blank input as absent
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Mask a phone number for logging, keeping the last 4 characters
pub fn mask_phone(phone_number: &str) -> String {
    let chars: Vec<char> = phone_number.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}
