//! Error types for the lock manager

use thiserror::Error;
use travel_common::TransactionId;

/// Result type for lock operations
pub type Result<T> = std::result::Result<T, LockError>;

/// Reasons a lock request fails
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    /// Still blocked when the deadlock timeout elapsed
    #[error("Transaction {txn} deadlocked waiting for {key}")]
    Deadlock { txn: TransactionId, key: String },

    /// The transaction released its locks while this request was waiting
    #[error("Transaction {txn} was aborted while waiting for {key}")]
    Aborted { txn: TransactionId, key: String },
}

impl From<LockError> for travel_common::Error {
    fn from(err: LockError) -> Self {
        match err {
            LockError::Deadlock { txn, key } => travel_common::Error::Deadlock { txn, key },
            LockError::Aborted { txn, .. } => travel_common::Error::Aborted(txn),
        }
    }
}
