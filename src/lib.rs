//! Travel reservation testbed
//!
//! Four participant services (flights, cars, rooms, customers) and a
//! two-phase commit middleware. Each service can run in its own process
//! behind a TCP listener, or everything can share one process.

pub mod config;
pub mod error;
pub mod server;

pub use config::{Role, ServerConfig};
pub use error::{Result, ServerError};

pub use travel_common::{Error, ServiceName, TransactionId};
pub use travel_coordinator::{CoordinatorConfig, LocalCluster, TransactionCoordinator};
