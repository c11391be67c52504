//! Error taxonomy shared by every service
//!
//! Business failures (unknown item, sold out, non-empty deletion target) are
//! never errors; they come back as `false` or `0`. Everything here is a
//! condition the caller has to react to.

use crate::TransactionId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for service operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can cross a service boundary
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Error {
    /// Waited past the deadlock timeout; abort and retry as a new transaction
    #[error("Transaction {txn} deadlocked waiting for {key}")]
    Deadlock { txn: TransactionId, key: String },

    /// Unknown or already terminated transaction
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(TransactionId),

    /// The transaction was aborted while one of its calls was blocked
    #[error("Transaction {0} was aborted")]
    Aborted(TransactionId),

    /// The remote service could not be reached
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// A request or reply could not be carried over the channel
    #[error("Transport error: {0}")]
    Transport(String),
}

impl Error {
    /// Whether the caller may retry the work as a new transaction
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Deadlock { .. } | Error::Aborted(_))
    }

    /// Whether the error came from the channel rather than the service
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Unavailable(_) | Error::Transport(_))
    }
}
