//! Resource managers for the travel domain
//!
//! One [`ResourceManager`] serves one kind of reservable item (flights, cars
//! or rooms). Every operation takes the table lock of its service through the
//! participant's [`LockManager`](travel_lock::LockManager) before touching the
//! snapshot-backed store, and the participant votes and applies the
//! coordinator's commit/abort decisions.

pub mod manager;
pub mod participant;
pub mod types;

pub use travel_common::TransactionId;

pub use manager::ResourceManager;
pub use participant::{ParticipantStatus, TableAccess, TransactionalTable};
pub use types::{ItemKind, ReservableItem, ResourceOperation, ResourceResponse};
