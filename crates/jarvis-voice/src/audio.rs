use crate::error::VoiceError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Samples per `audio-chunk` event when streaming to a service.
pub const SAMPLES_PER_CHUNK: usize = 1024;

/// Raw PCM layout; `width` is bytes per sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    pub rate: u32,
    pub width: u16,
    pub channels: u16,
}

impl Default for AudioFormat {
    /// 16 kHz mono s16le, what the speech services expect.
    fn default() -> Self {
        Self {
            rate: 16_000,
            width: 2,
            channels: 1,
        }
    }
}

impl AudioFormat {
    pub fn bytes_per_frame(&self) -> usize {
        usize::from(self.width) * usize::from(self.channels)
    }

    pub fn chunk_bytes(&self) -> usize {
        SAMPLES_PER_CHUNK * self.bytes_per_frame().max(1)
    }

    pub fn is_valid(&self) -> bool {
        self.rate > 0 && (1..=4).contains(&self.width) && self.channels > 0
    }

    /// Event data fields shared by `audio-start` and `audio-chunk`.
    pub fn to_event_data(&self) -> Value {
        json!({"rate": self.rate, "width": self.width, "channels": self.channels})
    }

    /// Reads a format from event data; missing fields fall back to the default.
    pub fn from_event_data(data: &serde_json::Map<String, Value>) -> Self {
        let default = Self::default();
        let field = |key: &str| data.get(key).and_then(Value::as_u64);
        Self {
            rate: field("rate").and_then(|v| u32::try_from(v).ok()).unwrap_or(default.rate),
            width: field("width").and_then(|v| u16::try_from(v).ok()).unwrap_or(default.width),
            channels: field("channels")
                .and_then(|v| u16::try_from(v).ok())
                .unwrap_or(default.channels),
        }
    }
}

/// PCM returned by a TTS service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    pub format: AudioFormat,
    pub pcm: Vec<u8>,
}

impl SynthesizedAudio {
    pub fn duration_ms(&self) -> u64 {
        let bytes_per_second = u64::from(self.format.rate) * self.format.bytes_per_frame() as u64;
        if bytes_per_second == 0 {
            return 0;
        }
        self.pcm.len() as u64 * 1000 / bytes_per_second
    }

    /// Renders a canonical 44-byte-header RIFF/WAVE file.
    ///
    /// Fails when the format cannot be described by the 16-bit and 32-bit
    /// header fields.
    pub fn to_wav(&self) -> Result<Vec<u8>, VoiceError> {
        let format = self.format;
        let unencodable = || {
            VoiceError::Protocol(format!(
                "audio cannot be encoded as WAV: rate={} width={} channels={} bytes={}",
                format.rate,
                format.width,
                format.channels,
                self.pcm.len()
            ))
        };
        if !format.is_valid() {
            return Err(unencodable());
        }

        let data_len = u32::try_from(self.pcm.len())
            .ok()
            .filter(|len| len.checked_add(36).is_some())
            .ok_or_else(unencodable)?;
        let block_align = u32::from(format.width)
            .checked_mul(u32::from(format.channels))
            .and_then(|align| u16::try_from(align).ok())
            .ok_or_else(unencodable)?;
        let byte_rate = format
            .rate
            .checked_mul(u32::from(block_align))
            .ok_or_else(unencodable)?;
        let bits_per_sample = format.width * 8;

        let mut wav = Vec::with_capacity(44 + self.pcm.len());
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(36 + data_len).to_le_bytes());
        wav.extend_from_slice(b"WAVE");
        wav.extend_from_slice(b"fmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes());
        wav.extend_from_slice(&format.channels.to_le_bytes());
        wav.extend_from_slice(&format.rate.to_le_bytes());
        wav.extend_from_slice(&byte_rate.to_le_bytes());
        wav.extend_from_slice(&block_align.to_le_bytes());
        wav.extend_from_slice(&bits_per_sample.to_le_bytes());
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&data_len.to_le_bytes());
        wav.extend_from_slice(&self.pcm);
        Ok(wav)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_header_describes_pcm() {
        let audio = SynthesizedAudio {
            format: AudioFormat {
                rate: 22_050,
                width: 2,
                channels: 1,
            },
            pcm: vec![0; 44_100],
        };
        let wav = audio.to_wav().unwrap();
        assert_eq!(wav.len(), 44 + 44_100);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]), 22_050);
        assert_eq!(u32::from_le_bytes([wav[28], wav[29], wav[30], wav[31]]), 44_100);
        assert_eq!(u16::from_le_bytes([wav[34], wav[35]]), 16);
        assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 44_100);
        assert_eq!(audio.duration_ms(), 1000);
    }

    #[test]
    fn wav_rejects_formats_the_header_cannot_hold() {
        let oversized = SynthesizedAudio {
            format: AudioFormat {
                rate: 22_050,
                width: 2,
                channels: 40_000,
            },
            pcm: vec![0; 8],
        };
        assert!(matches!(oversized.to_wav(), Err(VoiceError::Protocol(_))));

        let fast = SynthesizedAudio {
            format: AudioFormat {
                rate: u32::MAX,
                width: 4,
                channels: 2,
            },
            pcm: vec![0; 8],
        };
        assert!(matches!(fast.to_wav(), Err(VoiceError::Protocol(_))));

        let silent = SynthesizedAudio {
            format: AudioFormat {
                rate: 16_000,
                width: 0,
                channels: 1,
            },
            pcm: Vec::new(),
        };
        assert!(silent.to_wav().is_err());
    }

    #[test]
    fn format_round_trips_through_event_data() {
        let format = AudioFormat {
            rate: 22_050,
            width: 2,
            channels: 2,
        };
        let data = format.to_event_data();
        assert_eq!(AudioFormat::from_event_data(data.as_object().unwrap()), format);
        assert_eq!(format.chunk_bytes(), 4096);
        assert_eq!(
            AudioFormat::from_event_data(&serde_json::Map::new()),
            AudioFormat::default()
        );
    }
}
