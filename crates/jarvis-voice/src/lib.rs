//! Speech services over the Wyoming protocol.
//!
//! Wyoming is the line-oriented event protocol spoken by the Home Assistant
//! voice satellites: `wyoming-faster-whisper` for speech-to-text,
//! `wyoming-piper` for text-to-speech, and `wyoming-openwakeword` for wake
//! word detection. Each exchange opens one TCP connection, streams events,
//! and closes it again.

pub mod audio;
pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod service;
pub mod stt;
pub mod tts;
pub mod wake;

pub use audio::{AudioFormat, SynthesizedAudio};
pub use client::{ServiceInfo, WyomingClient};
pub use config::VoiceConfig;
pub use error::VoiceError;
pub use event::{read_event, write_event, Event};
pub use service::{ServiceAvailability, VoiceService};
pub use stt::SttClient;
pub use tts::TtsClient;
pub use wake::{Detection, WakeClient};
