//! Customer operations

use crate::types::CustomerId;
use serde::{Deserialize, Serialize};
use travel_resource::ItemKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerOperation {
    /// Create a customer with a generated id
    NewCustomer,
    /// Create a customer with a chosen id
    NewCustomerWithId { customer: CustomerId },
    DeleteCustomer { customer: CustomerId },
    /// Record one unit of an item
    Reserve {
        customer: CustomerId,
        kind: ItemKind,
        id: String,
        price: u32,
    },
    /// Drop one unit of an item
    CancelReservation {
        customer: CustomerId,
        kind: ItemKind,
        id: String,
    },
    QueryInfo { customer: CustomerId },
    Reservations { customer: CustomerId },
    /// Ledger entries, locking the table for writing
    ReservationsForUpdate { customer: CustomerId },
}
