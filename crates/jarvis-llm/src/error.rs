use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Ollama request timed out")]
    Timeout,

    #[error("Ollama request failed: {0}")]
    Request(String),

    #[error("Ollama returned an empty response")]
    EmptyResponse,

    #[error("Ollama response was not valid JSON")]
    InvalidJson,

    #[error("Invalid Ollama client configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(err.to_string())
        }
    }
}
