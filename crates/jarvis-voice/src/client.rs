use crate::audio::AudioFormat;
use crate::error::VoiceError;
use crate::event::{read_event, write_event, Event};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::net::TcpStream;

/// Program names a Wyoming service advertises in its `info` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceInfo {
    pub asr: Vec<String>,
    pub tts: Vec<String>,
    pub wake: Vec<String>,
}

impl ServiceInfo {
    fn from_event(event: &Event) -> Self {
        let names = |key: &str| -> Vec<String> {
            event
                .data
                .get(key)
                .and_then(Value::as_array)
                .map(|programs| {
                    programs
                        .iter()
                        .filter_map(|p| p.get("name").and_then(Value::as_str))
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default()
        };
        Self {
            asr: names("asr"),
            tts: names("tts"),
            wake: names("wake"),
        }
    }
}

/// Address and time budget of one Wyoming service.
#[derive(Debug, Clone)]
pub struct WyomingClient {
    addr: String,
    timeout: Duration,
}

impl WyomingClient {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Sends `describe` and waits for the service's `info` event.
    pub async fn describe(&self) -> Result<ServiceInfo, VoiceError> {
        self.exchange("describe", |mut conn| async move {
            conn.send(&Event::new("describe")).await?;
            let info = conn.expect("info").await?;
            Ok(ServiceInfo::from_event(&info))
        })
        .await
    }

    /// Opens a connection and runs `session` on it within the timeout.
    pub(crate) async fn exchange<T, F, Fut>(
        &self,
        operation: &'static str,
        session: F,
    ) -> Result<T, VoiceError>
    where
        F: FnOnce(Connection) -> Fut,
        Fut: Future<Output = Result<T, VoiceError>>,
    {
        let run = async {
            let conn = Connection::open(&self.addr).await?;
            session(conn).await
        };
        match tokio::time::timeout(self.timeout, run).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(addr = %self.addr, operation, "wyoming exchange timed out");
                Err(VoiceError::Timeout {
                    operation,
                    seconds: self.timeout.as_secs(),
                })
            }
        }
    }
}

pub(crate) struct Connection {
    stream: BufReader<TcpStream>,
}

impl Connection {
    async fn open(addr: &str) -> Result<Self, VoiceError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| VoiceError::Connect {
                addr: addr.to_string(),
                source,
            })?;
        tracing::debug!(addr, "connected to wyoming service");
        Ok(Self {
            stream: BufReader::new(stream),
        })
    }

    pub(crate) async fn send(&mut self, event: &Event) -> Result<(), VoiceError> {
        write_event(self.stream.get_mut(), event).await
    }

    pub(crate) async fn recv(&mut self) -> Result<Event, VoiceError> {
        read_event(&mut self.stream)
            .await?
            .ok_or_else(|| VoiceError::Protocol("connection closed by service".to_string()))
    }

    /// Receives the next event and checks its type.
    pub(crate) async fn expect(&mut self, event_type: &'static str) -> Result<Event, VoiceError> {
        let event = self.recv().await?;
        if event.is(event_type) {
            Ok(event)
        } else {
            Err(VoiceError::UnexpectedEvent {
                expected: event_type,
                got: event.event_type,
            })
        }
    }

    /// Streams `pcm` as `audio-start`, fixed-size `audio-chunk`s, `audio-stop`.
    pub(crate) async fn send_audio(
        &mut self,
        pcm: &[u8],
        format: AudioFormat,
    ) -> Result<(), VoiceError> {
        let format_data = format.to_event_data();
        self.send(&Event::new("audio-start").with_data(format_data.clone()))
            .await?;
        for chunk in pcm.chunks(format.chunk_bytes()) {
            let event = Event::new("audio-chunk")
                .with_data(format_data.clone())
                .with_payload(chunk.to_vec());
            self.send(&event).await?;
        }
        self.send(&Event::new("audio-stop")).await
    }
}

/// Rejects audio larger than a single event section may carry.
pub(crate) fn check_audio_input(pcm: &[u8], format: AudioFormat) -> Result<(), VoiceError> {
    if !format.is_valid() {
        return Err(VoiceError::Config(format!(
            "invalid audio format: rate={} width={} channels={}",
            format.rate, format.width, format.channels
        )));
    }
    if pcm.len() > crate::event::MAX_PAYLOAD_BYTES {
        return Err(VoiceError::TooLarge {
            what: "audio input",
            len: pcm.len(),
            limit: crate::event::MAX_PAYLOAD_BYTES,
        });
    }
    Ok(())
}
