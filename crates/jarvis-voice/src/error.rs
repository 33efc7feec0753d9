use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Failed to connect to Wyoming service at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Wyoming I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Wyoming protocol error: {0}")]
    Protocol(String),

    #[error("Wyoming {operation} timed out after {seconds} seconds")]
    Timeout {
        operation: &'static str,
        seconds: u64,
    },

    #[error("Expected Wyoming event '{expected}', got '{got}'")]
    UnexpectedEvent { expected: &'static str, got: String },

    #[error("{what} exceeds maximum size: {len} bytes (limit: {limit} bytes)")]
    TooLarge {
        what: &'static str,
        len: usize,
        limit: usize,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}
