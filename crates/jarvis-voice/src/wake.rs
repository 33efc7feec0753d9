use crate::audio::AudioFormat;
use crate::client::{check_audio_input, ServiceInfo, WyomingClient};
use crate::error::VoiceError;
use crate::event::Event;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detection {
    pub name: String,
    /// Milliseconds into the audio stream, when reported.
    pub timestamp: Option<u64>,
}

/// Wake word detection over Wyoming (`wyoming-openwakeword`).
#[derive(Debug, Clone)]
pub struct WakeClient {
    client: WyomingClient,
}

impl WakeClient {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: WyomingClient::new(addr, timeout),
        }
    }

    pub async fn describe(&self) -> Result<ServiceInfo, VoiceError> {
        self.client.describe().await
    }

    /// Streams `pcm` to the detector; `names` restricts the wake words.
    ///
    /// Returns `None` when the service answers `not-detected`.
    pub async fn detect(
        &self,
        pcm: &[u8],
        format: AudioFormat,
        names: Option<&[String]>,
    ) -> Result<Option<Detection>, VoiceError> {
        check_audio_input(pcm, format)?;
        let request = match names {
            Some(names) if !names.is_empty() => {
                Event::new("detect").with_data(json!({"names": names}))
            }
            _ => Event::new("detect"),
        };

        self.client
            .exchange("detect", |mut conn| async move {
                conn.send(&request).await?;
                conn.send_audio(pcm, format).await?;
                loop {
                    let event = conn.recv().await?;
                    match event.event_type.as_str() {
                        "detection" => {
                            let detection = Detection {
                                name: event.str_field("name").unwrap_or_default().to_string(),
                                timestamp: event.data.get("timestamp").and_then(Value::as_u64),
                            };
                            tracing::info!(name = %detection.name, "wake word detected");
                            return Ok(Some(detection));
                        }
                        "not-detected" => return Ok(None),
                        other => tracing::debug!(event = other, "ignoring wyoming event"),
                    }
                }
            })
            .await
    }
}
