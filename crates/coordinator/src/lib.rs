//! Transaction coordinator for the travel services
//!
//! The middleware hands out transaction ids, routes every call to the owning
//! participant while recording it as enlisted, and drives two-phase commit
//! across the enlisted set. Itinerary bookings run as a saga inside the
//! transaction and undo their own partial work when a step fails.

pub mod cluster;
pub mod config;
pub mod coordinator;
pub mod service;
pub mod transaction;

pub use cluster::{ClusterBuilder, LocalCluster};
pub use config::CoordinatorConfig;
pub use coordinator::{Participants, TransactionCoordinator};
pub use transaction::{Transaction, TransactionState};
