//! Adapters from concrete provider clients to the auth traits

use async_trait::async_trait;
use solardash_auth::{Channel, ProviderError, VerificationProvider};
use solardash_twilio::TwilioService;

/// Twilio Verify as a `VerificationProvider`
pub struct TwilioVerifier(pub TwilioService);

#[async_trait]
impl VerificationProvider for TwilioVerifier {
    async fn start_verification(
        &self,
        phone_number: &str,
        channel: Channel,
    ) -> Result<String, ProviderError> {
        self.0
            .send_otp(phone_number, channel.as_str())
            .await
            .map(|v| v.status)
            .map_err(|e| ProviderError::new(e.to_string()))
    }

    async fn check_verification(
        &self,
        phone_number: &str,
        code: &str,
    ) -> Result<String, ProviderError> {
        self.0
            .verify_otp(phone_number, code)
            .await
            .map(|v| v.status)
            .map_err(|e| ProviderError::new(e.to_string()))
    }
}
