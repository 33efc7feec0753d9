//! OpenAI-compatible endpoints for Home Assistant conversation agents.

use crate::api::ApiError;
use crate::engine::{self, EngineError, DEFAULT_MODEL};
use crate::AppState;
use axum::extract::{rejection::JsonRejection, Extension, Json};
use jarvis_intent::{function_definitions, generate_ha_response};
use jarvis_types::chat::{ChatCompletion, ChatCompletionRequest, FunctionDefinition, ModelCard, ModelList};
use std::sync::Arc;

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

/// Handler for `POST /v1/chat/completions`.
///
/// Requests that carry `entities` are answered by the rule-based adapter
/// without side effects; all others go through the command processor.
pub async fn chat_completions_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<ChatCompletionRequest>, JsonRejection>,
) -> Result<Json<ChatCompletion>, ApiError> {
    let Json(request) = payload?;
    if request.messages.is_empty() {
        return Err(EngineError::NoMessages.into());
    }

    if !request.entities.is_empty() {
        let model = if request.model.trim().is_empty() {
            DEFAULT_MODEL
        } else {
            request.model.as_str()
        };
        return Ok(Json(generate_ha_response(
            &request.messages,
            request.functions.as_deref(),
            &request.entities,
            model,
        )));
    }

    let completion = engine::generate_chat_completion(
        &state.processor,
        &request.messages,
        Some(request.model.as_str()),
    )
    .await?;
    Ok(Json(completion))
}

/// Handler for `GET /v1/models`.
pub async fn models_handler() -> Json<ModelList> {
    Json(ModelList {
        object: "list".to_string(),
        data: vec![ModelCard {
            id: DEFAULT_MODEL.to_string(),
            object: "model".to_string(),
            owned_by: "jarvis".to_string(),
        }],
    })
}

/// Handler for `GET /v1/functions`.
pub async fn functions_handler() -> Json<Vec<FunctionDefinition>> {
    Json(function_definitions())
}
