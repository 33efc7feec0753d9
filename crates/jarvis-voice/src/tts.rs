use crate::audio::{AudioFormat, SynthesizedAudio};
use crate::client::{ServiceInfo, WyomingClient};
use crate::error::VoiceError;
use crate::event::{Event, MAX_PAYLOAD_BYTES};
use serde_json::json;
use std::time::Duration;

/// Maximum text input size for synthesis (64 KiB).
const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

/// Text-to-speech over Wyoming (`wyoming-piper`).
#[derive(Debug, Clone)]
pub struct TtsClient {
    client: WyomingClient,
    voice: Option<String>,
}

impl TtsClient {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: WyomingClient::new(addr, timeout),
            voice: None,
        }
    }

    pub fn with_voice(mut self, voice: Option<String>) -> Self {
        self.voice = voice.filter(|v| !v.trim().is_empty());
        self
    }

    pub async fn describe(&self) -> Result<ServiceInfo, VoiceError> {
        self.client.describe().await
    }

    /// Synthesizes `text`; `voice` overrides the configured voice name.
    pub async fn synthesize(
        &self,
        text: &str,
        voice: Option<&str>,
    ) -> Result<SynthesizedAudio, VoiceError> {
        if text.len() > MAX_TTS_INPUT_BYTES {
            return Err(VoiceError::TooLarge {
                what: "text",
                len: text.len(),
                limit: MAX_TTS_INPUT_BYTES,
            });
        }
        let mut data = json!({"text": text});
        if let Some(voice) = voice.or(self.voice.as_deref()) {
            data["voice"] = json!({"name": voice});
        }

        let audio = self
            .client
            .exchange("synthesize", |mut conn| async move {
                conn.send(&Event::new("synthesize").with_data(data)).await?;

                let mut format = None;
                let mut pcm = Vec::new();
                loop {
                    let event = conn.recv().await?;
                    match event.event_type.as_str() {
                        "audio-start" => format = Some(AudioFormat::from_event_data(&event.data)),
                        "audio-chunk" => {
                            if format.is_none() {
                                format = Some(AudioFormat::from_event_data(&event.data));
                            }
                            let chunk = event.payload.unwrap_or_default();
                            if pcm.len() + chunk.len() > MAX_PAYLOAD_BYTES {
                                return Err(VoiceError::TooLarge {
                                    what: "synthesized audio",
                                    len: pcm.len() + chunk.len(),
                                    limit: MAX_PAYLOAD_BYTES,
                                });
                            }
                            pcm.extend_from_slice(&chunk);
                        }
                        "audio-stop" => break,
                        other => tracing::debug!(event = other, "ignoring wyoming event"),
                    }
                }
                let format = format.unwrap_or_default();
                if !format.is_valid() {
                    return Err(VoiceError::Protocol(format!(
                        "invalid audio format from TTS service: rate={} width={} channels={}",
                        format.rate, format.width, format.channels
                    )));
                }
                Ok(SynthesizedAudio { format, pcm })
            })
            .await?;

        tracing::info!(
            addr = %self.client.addr(),
            bytes = audio.pcm.len(),
            duration_ms = audio.duration_ms(),
            "synthesized speech"
        );
        Ok(audio)
    }
}
