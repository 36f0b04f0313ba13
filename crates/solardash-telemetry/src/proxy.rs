//! Dashboard proxy
//!
//! Fetches the latest device data and returns its nested `body`. Every
//! failure is folded into an `{"error": ...}` object rather than returned.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Reported when the upstream reply has no usable `body`
pub const DECODE_FAILURE: &str = "Failed to decode data.";

/// Telemetry errors
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("Telemetry API returned status {0}")]
    Status(u16),
    #[error("Missing field in telemetry response: {0}")]
    MissingField(&'static str),
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Source of real-time device data
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Full decoded reply of the real-time data query
    async fn fetch_realtime(&self) -> TelemetryResult<Value>;
}

#[derive(Clone)]
pub struct DashboardProxy {
    source: Arc<dyn TelemetrySource>,
}

impl DashboardProxy {
    pub fn new(source: Arc<dyn TelemetrySource>) -> Self {
        Self { source }
    }

    /// Real-time data for the dashboard, or an `{"error": ...}` object
    pub async fn fetch_dashboard(&self) -> Value {
        match self.source.fetch_realtime().await {
            Ok(mut reply) => match reply.get_mut("body").map(Value::take) {
                Some(body) if !body.is_null() => body,
                _ => {
                    warn!("Telemetry reply had no body");
                    json!({ "error": DECODE_FAILURE })
                }
            },
            Err(e) => {
                warn!("Telemetry fetch failed: {}", e);
                json!({ "error": e.to_string() })
            }
        }
    }
}
