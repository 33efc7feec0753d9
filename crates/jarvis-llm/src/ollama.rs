use crate::error::LlmError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Sampling temperature used for tool selection; low to keep output stable.
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    format: &'static str,
    stream: bool,
    options: ChatOptions,
    messages: [ChatTurn<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatTurn<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Async client for a local Ollama instance.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    http: reqwest::Client,
}

impl OllamaClient {
    pub fn new(
        base_url: impl AsRef<str>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Config(e.to_string()))?;

        Ok(Self {
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            model: model.into(),
            http,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends a system instruction and a user prompt to `/api/chat` in JSON mode.
    ///
    /// The assistant message content must itself be a JSON object; it is
    /// returned decoded.
    pub async fn ask(
        &self,
        prompt: &str,
        system_instruction: &str,
        temperature: f32,
    ) -> Result<Map<String, Value>, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            format: "json",
            stream: false,
            options: ChatOptions { temperature },
            messages: [
                ChatTurn {
                    role: "system",
                    content: system_instruction,
                },
                ChatTurn {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let url = format!("{}/api/chat", self.base_url);
        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "sending prompt to ollama");

        let response: ChatResponse = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let content = response
            .message
            .and_then(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) | Err(_) => {
                tracing::warn!(content = %content, "ollama reply is not a JSON object");
                Err(LlmError::InvalidJson)
            }
        }
    }
}
