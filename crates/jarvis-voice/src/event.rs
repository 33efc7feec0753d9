//! Wyoming event framing.
//!
//! An event is a single JSON header line terminated by `\n`, optionally
//! followed by `data_length` bytes of JSON data and `payload_length` bytes
//! of binary payload:
//!
//! ```text
//! {"type":"audio-chunk","version":"1.5.2","data_length":41,"payload_length":2048}\n
//! {"rate":16000,"width":2,"channels":1}<2048 bytes of PCM>
//! ```
//!
//! Data may also arrive inline in the header's `data` field; both forms are
//! merged on read.

use crate::error::VoiceError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const PROTOCOL_VERSION: &str = "1.5.2";

/// Header lines longer than this are rejected.
pub const MAX_HEADER_BYTES: usize = 64 * 1024;
/// Upper bound for both the data and the payload section of one event.
pub const MAX_PAYLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    pub event_type: String,
    pub data: Map<String, Value>,
    pub payload: Option<Vec<u8>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

impl Event {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            ..Self::default()
        }
    }

    /// Replaces the event data; non-object values are ignored.
    pub fn with_data(mut self, data: Value) -> Self {
        if let Value::Object(map) = data {
            self.data = map;
        }
        self
    }

    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn is(&self, event_type: &str) -> bool {
        self.event_type == event_type
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Serializes the event into its wire form.
    pub fn encode(&self) -> Result<Vec<u8>, VoiceError> {
        let data = if self.data.is_empty() {
            Vec::new()
        } else {
            serde_json::to_vec(&self.data).map_err(|e| VoiceError::Protocol(e.to_string()))?
        };
        let payload = self.payload.as_deref().unwrap_or_default();

        let header = Header {
            event_type: self.event_type.clone(),
            data: None,
            data_length: (!data.is_empty()).then_some(data.len()),
            payload_length: (!payload.is_empty()).then_some(payload.len()),
            version: Some(PROTOCOL_VERSION.to_string()),
        };
        let mut bytes =
            serde_json::to_vec(&header).map_err(|e| VoiceError::Protocol(e.to_string()))?;
        bytes.push(b'\n');
        bytes.extend_from_slice(&data);
        bytes.extend_from_slice(payload);
        Ok(bytes)
    }
}

pub async fn write_event<W>(writer: &mut W, event: &Event) -> Result<(), VoiceError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&event.encode()?).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads the next event; `Ok(None)` means the peer closed the connection
/// cleanly between events.
pub async fn read_event<R>(reader: &mut R) -> Result<Option<Event>, VoiceError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let read = (&mut *reader)
        .take(MAX_HEADER_BYTES as u64 + 1)
        .read_until(b'\n', &mut line)
        .await?;
    if read == 0 {
        return Ok(None);
    }
    if line.last() != Some(&b'\n') {
        if line.len() > MAX_HEADER_BYTES {
            return Err(VoiceError::TooLarge {
                what: "event header",
                len: line.len(),
                limit: MAX_HEADER_BYTES,
            });
        }
        return Err(VoiceError::Protocol(
            "connection closed inside event header".to_string(),
        ));
    }

    let header: Header = serde_json::from_slice(&line)
        .map_err(|e| VoiceError::Protocol(format!("invalid event header: {e}")))?;
    let mut data = header.data.unwrap_or_default();

    if let Some(length) = header.data_length.filter(|len| *len > 0) {
        let bytes = read_section(reader, "event data", length).await?;
        let extra: Map<String, Value> = serde_json::from_slice(&bytes)
            .map_err(|e| VoiceError::Protocol(format!("invalid event data: {e}")))?;
        data.extend(extra);
    }

    let payload = match header.payload_length.filter(|len| *len > 0) {
        Some(length) => Some(read_section(reader, "event payload", length).await?),
        None => None,
    };

    Ok(Some(Event {
        event_type: header.event_type,
        data,
        payload,
    }))
}

async fn read_section<R>(
    reader: &mut R,
    what: &'static str,
    length: usize,
) -> Result<Vec<u8>, VoiceError>
where
    R: AsyncBufRead + Unpin,
{
    if length > MAX_PAYLOAD_BYTES {
        return Err(VoiceError::TooLarge {
            what,
            len: length,
            limit: MAX_PAYLOAD_BYTES,
        });
    }
    let mut buf = vec![0u8; length];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encode_places_data_after_header() {
        let event = Event::new("transcript").with_data(json!({"text": "Licht an"}));
        let bytes = event.encode().unwrap();
        let newline = bytes.iter().position(|b| *b == b'\n').unwrap();

        let header: Value = serde_json::from_slice(&bytes[..newline]).unwrap();
        assert_eq!(header["type"], "transcript");
        assert_eq!(header["version"], PROTOCOL_VERSION);
        assert!(header.get("payload_length").is_none());

        let data = &bytes[newline + 1..];
        assert_eq!(header["data_length"], data.len());
        assert_eq!(
            serde_json::from_slice::<Value>(data).unwrap(),
            json!({"text": "Licht an"})
        );
    }

    #[tokio::test]
    async fn reads_back_data_and_payload() {
        let event = Event::new("audio-chunk")
            .with_data(json!({"rate": 16000, "width": 2, "channels": 1}))
            .with_payload(vec![1, 2, 3, 4]);
        let mut wire = event.encode().unwrap();
        wire.extend(Event::new("audio-stop").encode().unwrap());

        let mut reader: &[u8] = &wire;
        assert_eq!(read_event(&mut reader).await.unwrap(), Some(event));
        assert_eq!(
            read_event(&mut reader).await.unwrap(),
            Some(Event::new("audio-stop"))
        );
        assert_eq!(read_event(&mut reader).await.unwrap(), None);
    }

    #[tokio::test]
    async fn merges_inline_header_data() {
        let wire = b"{\"type\":\"detection\",\"data\":{\"name\":\"ok_nabu\"},\"data_length\":16}\n{\"timestamp\":42}";
        let mut reader: &[u8] = wire;
        let event = read_event(&mut reader).await.unwrap().unwrap();
        assert_eq!(event.str_field("name"), Some("ok_nabu"));
        assert_eq!(event.data["timestamp"], 42);
    }

    #[tokio::test]
    async fn rejects_oversized_sections() {
        let header = format!(
            "{{\"type\":\"audio-chunk\",\"payload_length\":{}}}\n",
            MAX_PAYLOAD_BYTES + 1
        );
        let mut reader: &[u8] = header.as_bytes();
        let err = read_event(&mut reader).await.unwrap_err();
        assert!(matches!(err, VoiceError::TooLarge { what: "event payload", .. }));

        let long_line = vec![b'x'; MAX_HEADER_BYTES + 10];
        let mut reader: &[u8] = &long_line;
        let err = read_event(&mut reader).await.unwrap_err();
        assert!(matches!(err, VoiceError::TooLarge { what: "event header", .. }));
    }

    #[tokio::test]
    async fn truncated_header_is_a_protocol_error() {
        let mut reader: &[u8] = b"{\"type\":\"info\"";
        let err = read_event(&mut reader).await.unwrap_err();
        assert!(matches!(err, VoiceError::Protocol(_)));
    }
}
