//! SolarDash Twilio - Client for the Twilio Verify v2 API
//!
//! Only the two calls the login flow needs are covered: starting a
//! verification and checking a submitted code.

pub mod models;

use models::{ApiErrorBody, VerificationResponse};
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Default Twilio Verify API origin
pub const DEFAULT_BASE_URL: &str = "https://verify.twilio.com";

/// Twilio client errors
#[derive(Debug, Error)]
pub enum TwilioError {
    #[error("Request to Twilio failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Twilio returned an error ({status}): {message}")]
    Api { status: u16, message: String },
}

pub type TwilioResult<T> = Result<T, TwilioError>;

#[derive(Debug)]
pub struct TwilioOptions {
    pub account_sid: String,
    pub auth_token: SecretString,
    pub service_id: String,
    /// API origin, overridable for tests
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl TwilioOptions {
    pub fn new(account_sid: String, auth_token: SecretString, service_id: String) -> Self {
        Self {
            account_sid,
            auth_token,
            service_id,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Builder pattern: set API origin
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Builder pattern: set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone)]
pub struct TwilioService {
    options: Arc<TwilioOptions>,
    client: Client,
}

impl TwilioService {
    pub fn new(options: TwilioOptions) -> TwilioResult<Self> {
        let client = Client::builder().timeout(options.timeout).build()?;
        Ok(Self {
            options: Arc::new(options),
            client,
        })
    }

    fn service_url(&self, resource: &str) -> String {
        format!(
            "{base}/v2/Services/{serv_id}/{resource}",
            base = self.options.base_url.trim_end_matches('/'),
            serv_id = self.options.service_id,
        )
    }

    /// Start a verification, sending a code to `recipient` over `channel`
    pub async fn send_otp(
        &self,
        recipient: &str,
        channel: &str,
    ) -> TwilioResult<VerificationResponse> {
        let url = self.service_url("Verifications");
        let form_body = [("To", recipient), ("Channel", channel)];

        let response = self
            .client
            .post(url)
            .basic_auth(
                &self.options.account_sid,
                Some(self.options.auth_token.expose_secret()),
            )
            .form(&form_body)
            .send()
            .await?;

        let verification = parse_response(response).await?;
        debug!(
            "Twilio verification started over {}: {}",
            verification.channel.as_deref().unwrap_or(channel),
            verification.status
        );
        Ok(verification)
    }

    /// Check `code` for `recipient`
    pub async fn verify_otp(
        &self,
        recipient: &str,
        code: &str,
    ) -> TwilioResult<VerificationResponse> {
        let url = self.service_url("VerificationCheck");
        let form_body = [("To", recipient), ("Code", code)];

        let response = self
            .client
            .post(url)
            .basic_auth(
                &self.options.account_sid,
                Some(self.options.auth_token.expose_secret()),
            )
            .form(&form_body)
            .send()
            .await?;

        let check = parse_response(response).await?;
        debug!("Twilio verification check: {}", check.status);
        Ok(check)
    }
}

async fn parse_response(response: Response) -> TwilioResult<VerificationResponse> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or_else(|_| status.canonical_reason().unwrap_or("unknown error").to_string());
        warn!("Twilio error ({}): {}", status, message);
        return Err(TwilioError::Api {
            status: status.as_u16(),
            message,
        });
    }

    Ok(response.json::<VerificationResponse>().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Path,
        http::{HeaderMap, StatusCode},
        routing::post,
        Form, Json, Router,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;

    /// Serve a stand-in for the Verify API on a random local port
    async fn spawn_fake_twilio() -> String {
        async fn verifications(
            Path(service): Path<String>,
            headers: HeaderMap,
            Form(form): Form<HashMap<String, String>>,
        ) -> (StatusCode, Json<Value>) {
            assert_eq!(service, "VA123");
            assert!(headers.contains_key("authorization"));
            if form.get("To").map(String::as_str) == Some("+1") {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"code": 60200, "message": "Invalid parameter `To`: +1"})),
                );
            }
            (
                StatusCode::CREATED,
                Json(json!({
                    "sid": "VE1",
                    "to": form["To"],
                    "channel": form["Channel"],
                    "status": "pending"
                })),
            )
        }

        async fn check(Form(form): Form<HashMap<String, String>>) -> Json<Value> {
            let status = if form["Code"] == "1234" { "approved" } else { "pending" };
            Json(json!({"sid": "VE1", "to": form["To"], "status": status}))
        }

        let app = Router::new()
            .route("/v2/Services/:service/Verifications", post(verifications))
            .route("/v2/Services/:service/VerificationCheck", post(check));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn service(base_url: String) -> TwilioService {
        let options = TwilioOptions::new(
            "AC123".to_string(),
            SecretString::from("token"),
            "VA123".to_string(),
        )
        .with_base_url(base_url);
        TwilioService::new(options).unwrap()
    }

    #[tokio::test]
    async fn test_send_otp() {
        let twilio = service(spawn_fake_twilio().await);

        let response = twilio.send_otp("+15555550100", "sms").await.unwrap();
        assert_eq!(response.status, "pending");
        assert_eq!(response.channel.as_deref(), Some("sms"));
    }

    #[tokio::test]
    async fn test_send_otp_api_error() {
        let twilio = service(spawn_fake_twilio().await);

        let err = twilio.send_otp("+1", "sms").await.unwrap_err();
        match err {
            TwilioError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid parameter `To`: +1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_verify_otp_statuses() {
        let twilio = service(spawn_fake_twilio().await);

        let approved = twilio.verify_otp("+15555550100", "1234").await.unwrap();
        assert_eq!(approved.status, "approved");

        let pending = twilio.verify_otp("+15555550100", "9999").await.unwrap();
        assert_eq!(pending.status, "pending");
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let twilio = service("http://127.0.0.1:1".to_string());

        let err = twilio.send_otp("+15555550100", "sms").await.unwrap_err();
        assert!(matches!(err, TwilioError::Http(_)));
    }
}
