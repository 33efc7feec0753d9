//! Local LLM access for the Jarvis backend.
//!
//! Talks to an Ollama instance in JSON mode so replies can be parsed into
//! structured tool calls.

pub mod error;
pub mod ollama;

pub use error::LlmError;
pub use ollama::{OllamaClient, DEFAULT_TEMPERATURE};
