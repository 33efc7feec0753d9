use crate::audio::AudioFormat;
use crate::client::{check_audio_input, ServiceInfo, WyomingClient};
use crate::error::VoiceError;
use crate::event::Event;
use serde_json::json;
use std::time::Duration;

/// Speech-to-text over Wyoming (`wyoming-faster-whisper` and friends).
#[derive(Debug, Clone)]
pub struct SttClient {
    client: WyomingClient,
    language: Option<String>,
}

impl SttClient {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: WyomingClient::new(addr, timeout),
            language: None,
        }
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language.filter(|l| !l.trim().is_empty());
        self
    }

    pub async fn describe(&self) -> Result<ServiceInfo, VoiceError> {
        self.client.describe().await
    }

    /// Transcribes raw PCM; `language` overrides the configured hint.
    pub async fn transcribe(
        &self,
        pcm: &[u8],
        format: AudioFormat,
        language: Option<&str>,
    ) -> Result<String, VoiceError> {
        check_audio_input(pcm, format)?;
        let language = language.or(self.language.as_deref()).map(str::to_string);

        let text = self
            .client
            .exchange("transcribe", |mut conn| async move {
                let request = match &language {
                    Some(language) => Event::new("transcribe").with_data(json!({"language": language})),
                    None => Event::new("transcribe"),
                };
                conn.send(&request).await?;
                conn.send_audio(pcm, format).await?;
                let transcript = conn.expect("transcript").await?;
                Ok(transcript.str_field("text").unwrap_or_default().trim().to_string())
            })
            .await?;

        tracing::info!(addr = %self.client.addr(), chars = text.chars().count(), "transcribed audio");
        Ok(text)
    }
}
