use thiserror::Error;
use travel_common::Error;

/// Result type for channel calls
pub type Result<T> = std::result::Result<T, TransportError>;

/// Failures carrying a request or its reply
#[derive(Error, Debug)]
pub enum TransportError {
    /// Nobody answered
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// The payload could not be encoded or decoded
    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The connection broke mid-call
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Unavailable(service) => Error::Unavailable(service),
            other => Error::Transport(other.to_string()),
        }
    }
}
