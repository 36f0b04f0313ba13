//! HTTP request handlers
//!
//! OTP login endpoints and the token-guarded dashboard endpoint.

use axum::{
    extract::State,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderMap, HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use solardash_auth::{authorize, OtpOutcome};
use solardash_core::{AllowedOrigins, Error};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::state::AppState;

/// Create the main application router
pub fn create_router(state: Arc<AppState>, cors: CorsLayer) -> Router {
    Router::new()
        // Login API
        .route("/api/send-otp", post(send_otp_handler))
        .route("/api/verify-otp", post(verify_otp_handler))
        // Data
        .route("/api/dashboard", get(dashboard_handler))
        .route("/api/health", get(health_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Build the CORS layer for the configured origins
pub fn cors_layer(origins: &AllowedOrigins) -> solardash_core::Result<CorsLayer> {
    let allow_origin = match origins {
        AllowedOrigins::Any => AllowOrigin::any(),
        AllowedOrigins::List(list) => {
            let values = list
                .iter()
                .map(|origin| {
                    HeaderValue::from_str(origin)
                        .map_err(|_| Error::config(format!("invalid CORS origin: {}", origin)))
                })
                .collect::<solardash_core::Result<Vec<_>>>()?;
            AllowOrigin::list(values)
        }
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]))
}

// ============================================================================
// Login API Handlers
// ============================================================================

/// A form field sent either as a JSON string or a bare number
///
/// Number inputs in the web app post values like `"otp": 1234`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(serde_json::Number),
}

impl FieldValue {
    pub fn into_text(self) -> String {
        match self {
            FieldValue::Text(text) => text,
            FieldValue::Number(number) => number.to_string(),
        }
    }
}

fn field_text(value: Option<FieldValue>) -> Option<String> {
    value.map(FieldValue::into_text)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    #[serde(default)]
    pub phone_number: Option<FieldValue>,
}

#[derive(Debug, Serialize)]
pub struct SendOtpResponse {
    pub status: String,
}

/// Text a one-time code to the given phone number
///
/// A missing or unparsable body is treated as an empty one. The number is
/// trimmed before it is forwarded to the provider.
async fn send_otp_handler(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<SendOtpRequest>>,
) -> Result<Json<SendOtpResponse>, ApiError> {
    let Json(request) = payload.unwrap_or_default();
    let phone_number = field_text(request.phone_number);
    let sent = state.otp.initiate_otp(phone_number.as_deref()).await?;
    Ok(Json(SendOtpResponse {
        status: sent.status,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    #[serde(default)]
    pub phone_number: Option<FieldValue>,
    #[serde(default)]
    pub otp: Option<FieldValue>,
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
}

/// Check a one-time code; on approval the reply carries a session token
///
/// Both fields are trimmed before they are forwarded to the provider.
async fn verify_otp_handler(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<VerifyOtpRequest>>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.unwrap_or_default();
    let phone_number = field_text(request.phone_number);
    let otp = field_text(request.otp);
    let outcome = state
        .otp
        .complete_otp(phone_number.as_deref(), otp.as_deref())
        .await?;

    let response = match outcome {
        OtpOutcome::Approved { session_token } => (
            StatusCode::OK,
            Json(VerifyOtpResponse {
                status: "approved",
                session_token: Some(session_token),
            }),
        ),
        OtpOutcome::Denied => (
            StatusCode::BAD_REQUEST,
            Json(VerifyOtpResponse {
                status: "denied",
                session_token: None,
            }),
        ),
    };
    Ok(response.into_response())
}

// ============================================================================
// Dashboard
// ============================================================================

/// Relay real-time device data to an authorized client
///
/// The raw `Authorization` header value is the session token.
async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let token = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());

    let result = authorize(&state.sessions, token).await;
    if let Some(reason) = result.reason {
        return Err(ApiError::Unauthorized(reason));
    }

    Ok(Json(state.dashboard.fetch_dashboard().await))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
