//! Response types for resource operations

use serde::{Deserialize, Serialize};

/// Response from a resource operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceResponse {
    Added { id: String },
    Deleted { id: String, deleted: bool },
    Count { id: String, count: u32 },
    Price { id: String, price: u32 },
    ReservedCount { id: String, reserved: u32 },
    Reserved { id: String, reserved: bool },
    Released { id: String, released: bool },
}
