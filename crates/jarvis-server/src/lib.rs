//! Jarvis server library logic.

pub mod api;
pub mod api_openai;
pub mod api_voice;
pub mod background;
pub mod config;
pub mod engine;
pub mod processor;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use config::Config;
use jarvis_hass::{DiscoveryOptions, DiscoveryService, EntityService, HassError, HomeAssistantClient};
use jarvis_llm::{LlmError, OllamaClient};
use jarvis_voice::VoiceService;
use processor::Processor;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Errors that prevent the application state from being built.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    HomeAssistant(#[from] HassError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Application state shared across all request handlers.
#[derive(Debug)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Home Assistant REST client.
    pub ha: HomeAssistantClient,
    /// Entity cache, refreshed in the background.
    pub discovery: Arc<DiscoveryService>,
    /// Name and state lookups over the entity cache.
    pub entity_service: EntityService,
    /// Fast path and LLM command processing.
    pub processor: Processor,
    /// Wyoming speech clients.
    pub voice: VoiceService,
}

impl AppState {
    /// Builds every client from `config`. No network traffic happens here.
    pub fn from_config(config: Config) -> Result<Self, StartupError> {
        let ha = HomeAssistantClient::new(
            &config.home_assistant.url,
            config.home_assistant.token.clone(),
            config.home_assistant.timeout(),
        )?;
        let discovery = Arc::new(DiscoveryService::new(
            ha.clone(),
            DiscoveryOptions {
                cache_max_entities: config.discovery.cache_max_entities,
                min_score: config.discovery.min_score,
            },
        ));
        let llm = OllamaClient::new(
            &config.ollama.url,
            config.ollama.model.clone(),
            config.ollama.timeout(),
        )?;

        Ok(Self {
            entity_service: EntityService::new(Some(Arc::clone(&discovery))),
            processor: Processor::new(ha.clone(), Arc::clone(&discovery), llm),
            voice: VoiceService::new(config.voice.clone()),
            config: Arc::new(config),
            ha,
            discovery,
        })
    }
}

/// Maximum request body size for JSON endpoints (1 MiB).
const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

/// Maximum request body size for raw audio uploads (16 MiB).
const MAX_AUDIO_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: Arc<AppState>) -> Router {
    // Voice routes carry raw PCM and need a larger body limit.
    let voice_routes = Router::new()
        .route("/api/voice/command", post(api_voice::voice_command_handler))
        .route("/api/voice/wake", post(api_voice::wake_handler))
        .layer(DefaultBodyLimit::max(MAX_AUDIO_BODY_BYTES));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/process", post(api::process_handler))
        .route("/api/status", get(api::status_handler))
        .route("/api/entities", get(api::entities_handler))
        .route("/api/devices/on", get(api::devices_on_handler))
        .route("/api/voice/speak", post(api_voice::speak_handler))
        .route("/v1/chat/completions", post(api_openai::chat_completions_handler))
        .route("/v1/models", get(api_openai::models_handler))
        .route("/v1/functions", get(api_openai::functions_handler))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .merge(voice_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}
