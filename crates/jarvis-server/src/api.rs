//! API handlers for the Jarvis server.

use crate::processor::{ProcessError, ProcessOutcome, ProcessPath};
use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Json, Query,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use jarvis_hass::{default_classifier, devices_on, EntitySummary, HassError, DEFAULT_POWER_DOMAINS};
use jarvis_llm::LlmError;
use jarvis_types::EntityState;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("unprocessable: {0}")]
    Unprocessable(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("upstream failure: {0}")]
    BadGateway(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<ProcessError> for ApiError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::HomeAssistant(HassError::Config(_))
            | ProcessError::Llm(LlmError::Config(_)) => {
                ApiError::InternalServerError(err.to_string())
            }
            _ => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection.status() {
            StatusCode::UNPROCESSABLE_ENTITY => ApiError::Unprocessable(rejection.body_text()),
            _ => ApiError::BadRequest(rejection.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Request body for `POST /api/process`.
#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    /// Natural language command.
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub path: String,
    pub service: String,
    pub entity_id: Option<String>,
    pub result: Value,
}

impl From<ProcessOutcome> for ProcessResponse {
    fn from(outcome: ProcessOutcome) -> Self {
        let path = match outcome.path {
            ProcessPath::Direct => "direct",
            ProcessPath::Llm => "llm",
        };
        Self {
            path: path.to_string(),
            service: outcome.service,
            entity_id: outcome.entity_id,
            result: outcome.result,
        }
    }
}

/// Handler for `POST /api/process`.
pub async fn process_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let Json(payload) = payload?;
    if payload.text.trim().is_empty() {
        return Err(ApiError::Unprocessable("text must not be empty".to_string()));
    }

    let outcome = state.processor.process(&payload.text).await.map_err(|e| {
        tracing::warn!(error = %e, "command processing failed");
        ApiError::from(e)
    })?;

    Ok(Json(ProcessResponse::from(outcome)))
}

#[derive(Debug, Deserialize)]
pub struct EntityQuery {
    pub name: Option<String>,
    pub state: Option<String>,
}

/// Handler for `GET /api/entities?name=...` or `?state=...`.
pub async fn entities_handler(
    Extension(state): Extension<Arc<AppState>>,
    query: Result<Query<EntityQuery>, QueryRejection>,
) -> Result<Json<Vec<EntitySummary>>, ApiError> {
    let Query(query) = query?;
    let name = query.name.filter(|n| !n.trim().is_empty());
    let wanted_state = query.state.filter(|s| !s.trim().is_empty());
    match (name, wanted_state) {
        (Some(name), _) => Ok(Json(state.entity_service.find_entities_by_name(&name))),
        (None, Some(wanted)) => Ok(Json(state.entity_service.find_entities_by_state(&wanted))),
        (None, None) => Err(ApiError::BadRequest(
            "either name or state query parameter is required".to_string(),
        )),
    }
}

#[derive(Debug, Deserialize)]
pub struct DevicesOnQuery {
    /// Comma separated domains; defaults to lights and switches.
    pub domains: Option<String>,
}

/// Handler for `GET /api/devices/on`.
pub async fn devices_on_handler(
    Extension(state): Extension<Arc<AppState>>,
    query: Result<Query<DevicesOnQuery>, QueryRejection>,
) -> Result<Json<Vec<EntityState>>, ApiError> {
    let Query(query) = query?;
    let requested: Vec<String> = query
        .domains
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(|d| d.trim().to_lowercase())
        .filter(|d| !d.is_empty())
        .collect();
    let domains: Vec<&str> = if requested.is_empty() {
        DEFAULT_POWER_DOMAINS.to_vec()
    } else {
        requested.iter().map(String::as_str).collect()
    };

    let entities = state.discovery.entities();
    let states: Vec<EntityState> = entities.iter().map(EntityState::from).collect();
    Ok(Json(devices_on(&states, &domains, default_classifier())))
}

/// Handler for `GET /api/status`.
///
/// Contacts Home Assistant and the Wyoming services, so it is slower than
/// `/health` and not meant for liveness checks.
pub async fn status_handler(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    let (ha_reachable, voice) = tokio::join!(state.ha.ping(), state.voice.availability());
    let ha_error = ha_reachable.as_ref().err().map(ToString::to_string);
    let voice_config = state.voice.config();

    Json(json!({
        "app": state.config.app.name,
        "environment": state.config.app.environment,
        "version": env!("CARGO_PKG_VERSION"),
        "discovery": {
            "entities": state.discovery.len(),
            "last_refresh_seconds_ago": state.discovery.last_refresh_age().map(|age| age.as_secs()),
        },
        "home_assistant": {
            "url": state.ha.base_url(),
            "reachable": ha_reachable.is_ok(),
            "error": ha_error,
        },
        "llm": {
            "model": state.processor.model(),
        },
        "voice": {
            "enabled": state.voice.is_enabled(),
            "stt_addr": voice_config.stt_addr,
            "tts_addr": voice_config.tts_addr,
            "wake_addr": voice_config.wake_addr,
            "services": voice,
        },
    }))
}
