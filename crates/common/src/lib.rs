//! Common types for the travel reservation testbed
//!
//! This crate defines:
//! - Transaction IDs (monotonic, allocated by the coordinator)
//! - Names of the participant services
//! - The error taxonomy that crosses service boundaries

mod error;
mod service;
mod transaction_id;

pub use error::{Error, Result};
pub use service::ServiceName;
pub use transaction_id::TransactionId;
