//! Customer manager
//!
//! Keeps one reservation ledger per customer. The ledger is a transactional
//! table like the inventories, locked and rolled back the same way.

pub mod manager;
pub mod types;

pub use manager::CustomerManager;
pub use types::{Customer, CustomerId, CustomerOperation, CustomerResponse, ReservedItem};
