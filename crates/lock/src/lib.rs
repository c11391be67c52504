//! Lock manager for participant services
//!
//! Provides key-level locking with read/write modes. Conflicting requests
//! block the calling thread; a request still blocked after the deadlock
//! timeout fails with [`LockError::Deadlock`] and the caller is expected to
//! abort its transaction.

pub mod error;
pub mod manager;
pub mod table;

pub use error::{LockError, Result};
pub use manager::{DEADLOCK_TIMEOUT, LockManager};
pub use table::{LockAttemptResult, LockInfo, LockMode, LockTable};
