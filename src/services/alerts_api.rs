use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError,
    models::{PushSubscription, SubscriptionKeys, ThresholdType},
};

/// The alert backend as seen by the preference reconciler.
#[async_trait]
pub trait AlertsBackend: Send + Sync {
    // GET /alerts/status?endpoint=...
    async fn status(&self, endpoint: &str) -> Result<AlertStatus, ApiError>;

    // POST /alerts/subscribe
    async fn subscribe(&self, req: &SubscribeRequest) -> Result<(), ApiError>;

    // POST /alerts/test
    async fn send_test(&self, req: &TestRequest) -> Result<(), ApiError>;
}

#[derive(Clone)]
pub struct AlertsApiClient {
    http: Client,
    base_url: String,
}

impl AlertsApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl AlertsBackend for AlertsApiClient {
    async fn status(&self, endpoint: &str) -> Result<AlertStatus, ApiError> {
        let res = self
            .http
            .get(self.url("/alerts/status"))
            .query(&[("endpoint", endpoint)])
            .send()
            .await?;

        let res = ensure_success(res).await?;
        let body = res.text().await?;
        serde_json::from_str::<AlertStatus>(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn subscribe(&self, req: &SubscribeRequest) -> Result<(), ApiError> {
        let res = self
            .http
            .post(self.url("/alerts/subscribe"))
            .json(req)
            .send()
            .await?;

        ensure_success(res).await.map(|_| ())
    }

    async fn send_test(&self, req: &TestRequest) -> Result<(), ApiError> {
        let res = self
            .http
            .post(self.url("/alerts/test"))
            .json(req)
            .send()
            .await?;

        ensure_success(res).await.map(|_| ())
    }
}

async fn ensure_success(res: Response) -> Result<Response, ApiError> {
    if res.status().is_success() {
        return Ok(res);
    }

    let status = res.status().as_u16();
    let body = res.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status,
        detail: error_detail(&body),
    })
}

/// Pulls `{"detail": "..."}` out of an error body; anything else yields `None`.
fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("detail")
        .and_then(|d| d.as_str())
        .map(str::to_string)
        .filter(|d| !d.trim().is_empty())
}

/// Backend's canonical record for one subscription endpoint.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct AlertStatus {
    #[serde(default)]
    pub threshold_enabled: bool,
    #[serde(default)]
    pub volatility_alert: bool,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub threshold_type: Option<ThresholdType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
    pub threshold: Option<f64>,
    pub threshold_type: ThresholdType,
    pub volatility_alert: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRequest {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

impl From<&PushSubscription> for TestRequest {
    fn from(sub: &PushSubscription) -> Self {
        Self {
            endpoint: sub.endpoint.clone(),
            keys: sub.keys.clone(),
        }
    }
}
