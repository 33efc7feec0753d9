use crate::error::HassError;
use jarvis_types::EntityState;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Minimal async client for the Home Assistant REST API.
///
/// The underlying `reqwest::Client` is built once and shared; cloning the
/// client is cheap.
#[derive(Clone)]
pub struct HomeAssistantClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

impl fmt::Debug for HomeAssistantClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HomeAssistantClient")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl HomeAssistantClient {
    /// Creates a client for `base_url` authenticating with a long-lived access token.
    ///
    /// A trailing `/` on the base URL is ignored.
    pub fn new(
        base_url: impl AsRef<str>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, HassError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("jarvis-backend/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HassError::Config(e.to_string()))?;

        Ok(Self {
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            token: token.into(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Invokes `POST /api/services/{domain}/{service}` with `data` as the body.
    ///
    /// Returns the decoded response, usually the list of states that changed.
    pub async fn call_service(
        &self,
        domain: &str,
        service: &str,
        data: &Value,
    ) -> Result<Value, HassError> {
        const OP: &str = "service call";
        let url = format!("{}/api/services/{}/{}", self.base_url, domain, service);

        tracing::debug!(domain, service, "calling Home Assistant service");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(data)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| HassError::from_reqwest(OP, e))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| HassError::from_reqwest(OP, e))?;
        if body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&body).map_err(|e| HassError::Decode {
            operation: OP,
            message: e.to_string(),
        })
    }

    /// Retrieves every entity state via `GET /api/states`.
    pub async fn fetch_states(&self) -> Result<Vec<EntityState>, HassError> {
        const OP: &str = "states fetch";
        let url = format!("{}/api/states", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| HassError::from_reqwest(OP, e))?;

        response
            .json::<Vec<EntityState>>()
            .await
            .map_err(|e| HassError::from_reqwest(OP, e))
    }

    /// Checks that the API answers `GET /api/` with a success status.
    pub async fn ping(&self) -> Result<(), HassError> {
        let url = format!("{}/api/", self.base_url);
        self.http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map(|_| ())
            .map_err(|e| HassError::from_reqwest("ping", e))
    }
}
