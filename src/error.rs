use thiserror::Error;

/// Server startup errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot resolve address {0}")]
    InvalidAddress(String),
}

pub type Result<T> = std::result::Result<T, ServerError>;
