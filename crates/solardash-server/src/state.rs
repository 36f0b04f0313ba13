//! Shared application state

use solardash_auth::{OtpFlow, SessionStore};
use solardash_telemetry::DashboardProxy;

/// Shared application state
pub struct AppState {
    /// OTP login flow
    pub otp: OtpFlow,
    /// Issued session tokens
    pub sessions: SessionStore,
    /// Real-time telemetry relay
    pub dashboard: DashboardProxy,
}

impl AppState {
    /// Create a new application state
    ///
    /// The session store is taken from the OTP flow so that tokens it issues
    /// are the ones the dashboard route checks.
    pub fn new(otp: OtpFlow, dashboard: DashboardProxy) -> Self {
        Self {
            sessions: otp.sessions().clone(),
            otp,
            dashboard,
        }
    }
}
