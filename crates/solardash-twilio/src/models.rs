//! Twilio Verify API payloads

use serde::Deserialize;

/// Response of the `Verifications` and `VerificationCheck` endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationResponse {
    /// `pending`, `approved`, `canceled`, ...
    pub status: String,
    /// Delivery channel
    #[serde(default)]
    pub channel: Option<String>,
}

/// Error body Twilio returns alongside non-2xx statuses
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_verification() {
        let json = r#"{
            "sid": "VE1234",
            "service_sid": "VA1234",
            "account_sid": "AC1234",
            "to": "+15555550100",
            "channel": "sms",
            "status": "pending",
            "valid": false
        }"#;
        let response: VerificationResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.status, "pending");
        assert_eq!(response.channel.as_deref(), Some("sms"));
    }

    #[test]
    fn test_decode_error_body() {
        let json = r#"{
            "code": 60200,
            "message": "Invalid parameter `To`: +1",
            "more_info": "https://www.twilio.com/docs/errors/60200",
            "status": 400
        }"#;
        let body: ApiErrorBody = serde_json::from_str(json).unwrap();
        assert!(body.message.starts_with("Invalid parameter"));
    }
}
