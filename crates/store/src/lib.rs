//! Transactional storage for participant tables
//!
//! Every table is an in-memory map. The first time a transaction touches a
//! table, the whole table is copied aside; commit throws the copy away and
//! abort puts it back.

mod snapshot;

pub use snapshot::TransactionalStore;
