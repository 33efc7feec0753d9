//! Voice endpoints backed by the Wyoming speech services.
//!
//! Audio bodies are raw PCM; the layout comes from the `rate`, `width` and
//! `channels` query parameters and defaults to 16 kHz mono s16le.

use crate::api::{ApiError, ProcessResponse};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Json, Query,
    },
    http::header,
    response::{IntoResponse, Response},
};
use jarvis_voice::{AudioFormat, VoiceError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct AudioQuery {
    pub rate: Option<u32>,
    pub width: Option<u16>,
    pub channels: Option<u16>,
    /// Transcription language hint for `/api/voice/command`.
    pub language: Option<String>,
}

impl AudioQuery {
    fn format(&self) -> AudioFormat {
        let default = AudioFormat::default();
        AudioFormat {
            rate: self.rate.unwrap_or(default.rate),
            width: self.width.unwrap_or(default.width),
            channels: self.channels.unwrap_or(default.channels),
        }
    }
}

impl From<VoiceError> for ApiError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::Config(_) | VoiceError::TooLarge { .. } => {
                ApiError::BadRequest(err.to_string())
            }
            _ => ApiError::BadGateway(err.to_string()),
        }
    }
}

fn ensure_enabled(state: &AppState) -> Result<(), ApiError> {
    if state.voice.is_enabled() {
        Ok(())
    } else {
        Err(ApiError::ServiceUnavailable(
            "voice services are disabled".to_string(),
        ))
    }
}

fn ensure_audio(body: &Bytes) -> Result<(), ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("audio body must not be empty".to_string()));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoiceCommandResponse {
    pub transcript: String,
    /// `None` when nothing was understood.
    pub outcome: Option<ProcessResponse>,
}

/// Handler for `POST /api/voice/command`.
///
/// Transcribes the audio and runs the transcript through the processor.
pub async fn voice_command_handler(
    Extension(state): Extension<Arc<AppState>>,
    query: Result<Query<AudioQuery>, QueryRejection>,
    body: Bytes,
) -> Result<Json<VoiceCommandResponse>, ApiError> {
    ensure_enabled(&state)?;
    let Query(query) = query?;
    ensure_audio(&body)?;

    let transcript = state
        .voice
        .stt()
        .transcribe(&body, query.format(), query.language.as_deref())
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "transcription failed");
            ApiError::from(e)
        })?;
    if transcript.is_empty() {
        return Ok(Json(VoiceCommandResponse {
            transcript,
            outcome: None,
        }));
    }

    let outcome = state.processor.process(&transcript).await?;
    Ok(Json(VoiceCommandResponse {
        transcript,
        outcome: Some(ProcessResponse::from(outcome)),
    }))
}

#[derive(Debug, Deserialize)]
pub struct SpeakRequest {
    pub text: String,
    pub voice: Option<String>,
}

/// Handler for `POST /api/voice/speak`. Answers with a WAV file.
pub async fn speak_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<SpeakRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    ensure_enabled(&state)?;
    let Json(payload) = payload?;
    if payload.text.trim().is_empty() {
        return Err(ApiError::Unprocessable("text must not be empty".to_string()));
    }

    let audio = state
        .voice
        .tts()
        .synthesize(&payload.text, payload.voice.as_deref())
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "speech synthesis failed");
            ApiError::from(e)
        })?;
    tracing::debug!(duration_ms = audio.duration_ms(), "synthesized speech");

    let wav = audio.to_wav()?;
    Ok(([(header::CONTENT_TYPE, "audio/wav")], wav).into_response())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WakeResponse {
    pub detected: bool,
    pub name: Option<String>,
    pub timestamp: Option<u64>,
}

/// Handler for `POST /api/voice/wake`.
pub async fn wake_handler(
    Extension(state): Extension<Arc<AppState>>,
    query: Result<Query<AudioQuery>, QueryRejection>,
    body: Bytes,
) -> Result<Json<WakeResponse>, ApiError> {
    ensure_enabled(&state)?;
    let Query(query) = query?;
    ensure_audio(&body)?;

    let detection = state.voice.wake().detect(&body, query.format(), None).await?;
    Ok(Json(match detection {
        Some(detection) => WakeResponse {
            detected: true,
            name: Some(detection.name),
            timestamp: detection.timestamp,
        },
        None => WakeResponse {
            detected: false,
            name: None,
            timestamp: None,
        },
    }))
}
