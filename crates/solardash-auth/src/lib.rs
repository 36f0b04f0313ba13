//! SolarDash Auth - OTP login and session tokens
//!
//! Provides the phone-number login flow and the bearer tokens that guard the
//! dashboard endpoint.
//!
//! # Login Flow
//!
//! 1. Client posts a phone number; `OtpFlow::initiate_otp()` asks the
//!    verification provider to text a code
//! 2. Client posts the phone number and the code it received
//! 3. `OtpFlow::complete_otp()` checks the code with the provider and, when it
//!    is approved, issues a session token from the `SessionStore`
//! 4. Client sends the raw token in the `Authorization` header; `authorize()`
//!    classifies it as valid, expired, or unknown
//!
//! # Example
//!
//! ```no_run
//! use solardash_auth::{authorize, SessionStore};
//!
//! async fn example() {
//!     let store = SessionStore::new();
//!     let token = store.create(chrono::Duration::minutes(30)).await;
//!
//!     let result = authorize(&store, Some(&token)).await;
//!     assert!(result.authorized);
//! }
//! ```

pub mod authorize;
pub mod otp;
pub mod session;

pub use authorize::{authorize, AuthDenial, AuthResult};
pub use otp::{
    mask_phone, Channel, OtpError, OtpFlow, OtpOutcome, OtpResult, OtpSent, ProviderError,
    VerificationProvider, STATUS_APPROVED,
};
pub use session::{SessionStore, TokenStatus};
