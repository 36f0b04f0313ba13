//! Solinteg cloud open API client
//!
//! Each fetch logs in for a fresh bearer token and then queries the
//! configured device. Tokens are not cached between fetches.

use crate::proxy::{TelemetryError, TelemetryResult, TelemetrySource};
use async_trait::async_trait;
use reqwest::{header, Client};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const LOGIN_PATH: &str = "/openapi/v2/loginv2/auth";
const REALTIME_PATH: &str = "/openapi/v2/device/queryDeviceRealtimeData";

#[derive(Debug)]
pub struct SolintegOptions {
    pub base_url: String,
    pub account: String,
    pub password: SecretString,
    /// Serial number of the device to query
    pub device_sn: String,
    /// Per-request timeout
    pub timeout: Duration,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    auth_account: &'a str,
    auth_password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    body: Option<String>,
}

pub struct SolintegClient {
    options: SolintegOptions,
    client: Client,
}

impl SolintegClient {
    pub fn new(options: SolintegOptions) -> TelemetryResult<Self> {
        let client = Client::builder().timeout(options.timeout).build()?;
        Ok(Self { options, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.options.base_url.trim_end_matches('/'), path)
    }

    /// Log in and return the bearer token
    async fn login(&self) -> TelemetryResult<String> {
        let request = LoginRequest {
            auth_account: &self.options.account,
            auth_password: self.options.password.expose_secret(),
        };

        let response = self
            .client
            .post(self.url(LOGIN_PATH))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TelemetryError::Status(response.status().as_u16()));
        }

        let login: LoginResponse = response.json().await?;
        login.body.ok_or(TelemetryError::MissingField("body"))
    }

    /// Query the configured device with a bearer token
    async fn query_realtime(&self, token: &str) -> TelemetryResult<Value> {
        let response = self
            .client
            .get(self.url(REALTIME_PATH))
            .bearer_auth(token)
            .header(header::ACCEPT, "application/json")
            .header("token", token)
            .query(&[("deviceSn", self.options.device_sn.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TelemetryError::Status(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl TelemetrySource for SolintegClient {
    async fn fetch_realtime(&self) -> TelemetryResult<Value> {
        let token = self.login().await?;
        debug!("Logged in to Solinteg cloud");
        self.query_realtime(&token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::DashboardProxy;
    use axum::{
        extract::Query,
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;

    const TOKEN: &str = "cloud-token-1";

    async fn spawn_fake_cloud() -> String {
        async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
            if body["authAccount"] == "ops@example.com" && body["authPassword"] == "hunter2" {
                (StatusCode::OK, Json(json!({"code": 0, "body": TOKEN})))
            } else {
                (StatusCode::UNAUTHORIZED, Json(json!({"code": 401})))
            }
        }

        async fn realtime(
            headers: HeaderMap,
            Query(query): Query<HashMap<String, String>>,
        ) -> (StatusCode, Json<Value>) {
            let bearer = format!("Bearer {}", TOKEN);
            if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some(bearer.as_str())
                || headers.get("token").and_then(|v| v.to_str().ok()) != Some(TOKEN)
            {
                return (StatusCode::FORBIDDEN, Json(json!({})));
            }
            let body = json!({"deviceSn": query["deviceSn"], "pac": 3.1});
            (StatusCode::OK, Json(json!({"code": 0, "body": body})))
        }

        let app = Router::new()
            .route(LOGIN_PATH, post(login))
            .route(REALTIME_PATH, get(realtime));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(base_url: String, password: &str) -> SolintegClient {
        SolintegClient::new(SolintegOptions {
            base_url,
            account: "ops@example.com".to_string(),
            password: SecretString::from(password),
            device_sn: "A102300100402049".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_realtime() {
        let cloud = client(spawn_fake_cloud().await, "hunter2");

        let reply = cloud.fetch_realtime().await.unwrap();
        assert_eq!(reply["body"]["deviceSn"], "A102300100402049");
    }

    #[tokio::test]
    async fn test_proxy_unwraps_body() {
        let cloud = client(spawn_fake_cloud().await, "hunter2");
        let proxy = DashboardProxy::new(Arc::new(cloud));

        let data = proxy.fetch_dashboard().await;
        assert_eq!(data, json!({"deviceSn": "A102300100402049", "pac": 3.1}));
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let cloud = client(spawn_fake_cloud().await, "wrong");

        let err = cloud.fetch_realtime().await.unwrap_err();
        assert!(matches!(err, TelemetryError::Status(401)));
    }

    #[tokio::test]
    async fn test_unreachable_cloud_reports_error() {
        let proxy = DashboardProxy::new(Arc::new(client(
            "http://127.0.0.1:1".to_string(),
            "hunter2",
        )));

        let data = proxy.fetch_dashboard().await;
        assert!(data["error"].is_string());
    }
}
