//! Operations a resource manager executes within a transaction

use serde::{Deserialize, Serialize};

/// Operations on a flight, car or room inventory
///
/// `id` is the flight number or the location; the manager turns it into a
/// storage key for its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceOperation {
    /// Add units, creating the item if needed; a zero price keeps the old one
    Add { id: String, count: u32, price: u32 },

    /// Remove an item with no units left
    Delete { id: String },

    /// Units available
    Query { id: String },

    /// Current price
    QueryPrice { id: String },

    /// Units handed out
    QueryReserved { id: String },

    /// Hand out one unit
    Reserve { id: String },

    /// Return units previously handed out
    Release { id: String, amount: u32 },
}
