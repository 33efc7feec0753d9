//! OpenAI-style chat completions backed by the [`Processor`].
//!
//! The processor has already executed the action by the time a reply is
//! built, so replies only confirm what happened.

use crate::processor::{ProcessOutcome, Processor};
use chrono::Utc;
use jarvis_types::chat::{ChatCompletion, ChatMessage};
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "jarvis";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("No messages provided")]
    NoMessages,
}

/// Runs the last user message through `processor` and answers in German.
pub async fn generate_chat_completion(
    processor: &Processor,
    messages: &[ChatMessage],
    model: Option<&str>,
) -> Result<ChatCompletion, EngineError> {
    if messages.is_empty() {
        return Err(EngineError::NoMessages);
    }
    let model = model.filter(|m| !m.trim().is_empty()).unwrap_or(DEFAULT_MODEL);

    let Some(message) = messages.iter().rev().find(|m| m.role == "user") else {
        return Ok(text_completion(model, "Ich habe nichts gehört."));
    };
    let content = message.content.as_deref().unwrap_or_default();

    let reply = match processor.process(content).await {
        Ok(outcome) => reply_for(&outcome),
        Err(e) => {
            tracing::warn!(error = %e, "chat command failed");
            format!("Das konnte ich nicht ausführen: {e}")
        }
    };
    Ok(text_completion(model, reply))
}

/// Speaks a scalar result verbatim, otherwise confirms the service call.
pub fn reply_for(outcome: &ProcessOutcome) -> String {
    match &outcome.result {
        Value::String(s) if !s.is_empty() => return s.clone(),
        Value::Number(n) if n.as_f64() != Some(0.0) => return n.to_string(),
        _ => {}
    }
    if outcome.service.is_empty() {
        return "Befehl verarbeitet.".to_string();
    }
    let entity = outcome.entity_id.as_deref().unwrap_or("dem Gerät");
    format!("Ich habe {} für {} ausgeführt.", outcome.service, entity)
}

fn text_completion(model: &str, text: impl Into<String>) -> ChatCompletion {
    ChatCompletion::text(
        format!("chatcmpl-{}", uuid::Uuid::new_v4()),
        Utc::now().timestamp(),
        model.to_string(),
        text,
    )
}
