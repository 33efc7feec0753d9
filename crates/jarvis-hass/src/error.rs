use thiserror::Error;

/// Errors returned by the Home Assistant REST client.
#[derive(Error, Debug)]
pub enum HassError {
    #[error("Home Assistant {0} timed out")]
    Timeout(&'static str),

    #[error("Home Assistant {operation} failed: {message}")]
    Request {
        operation: &'static str,
        message: String,
    },

    #[error("Home Assistant {operation} returned an unexpected body: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },

    #[error("Invalid Home Assistant client configuration: {0}")]
    Config(String),
}

impl HassError {
    pub(crate) fn from_reqwest(operation: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(operation)
        } else if err.is_decode() {
            Self::Decode {
                operation,
                message: err.to_string(),
            }
        } else {
            Self::Request {
                operation,
                message: err.to_string(),
            }
        }
    }
}
