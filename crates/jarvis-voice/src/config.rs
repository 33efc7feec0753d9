use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_STT_ADDR: &str = "127.0.0.1:10300";
pub const DEFAULT_TTS_ADDR: &str = "127.0.0.1:10200";
pub const DEFAULT_WAKE_ADDR: &str = "127.0.0.1:10400";

fn default_stt_addr() -> String {
    DEFAULT_STT_ADDR.to_string()
}

fn default_tts_addr() -> String {
    DEFAULT_TTS_ADDR.to_string()
}

fn default_wake_addr() -> String {
    DEFAULT_WAKE_ADDR.to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

/// Addresses of the Wyoming speech services.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoiceConfig {
    /// Voice routes answer 503 while this is false.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_stt_addr")]
    pub stt_addr: String,
    #[serde(default = "default_tts_addr")]
    pub tts_addr: String,
    #[serde(default = "default_wake_addr")]
    pub wake_addr: String,
    /// Language hint for transcription, e.g. `"de"`.
    #[serde(default)]
    pub language: Option<String>,
    /// Default TTS voice name; the service default is used when unset.
    #[serde(default)]
    pub voice: Option<String>,
    /// Upper bound for a whole Wyoming exchange.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            stt_addr: default_stt_addr(),
            tts_addr: default_tts_addr(),
            wake_addr: default_wake_addr(),
            language: None,
            voice: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl VoiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }
}
