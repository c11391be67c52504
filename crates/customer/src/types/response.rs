use crate::types::{CustomerId, ReservedItem};
use serde::{Deserialize, Serialize};

/// Response from a customer operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerResponse {
    Created { customer: CustomerId },
    /// Whether a create, delete, reserve or cancel took effect
    Done { customer: CustomerId, done: bool },
    Info { customer: CustomerId, bill: String },
    /// `None` for an unknown customer
    Reservations {
        customer: CustomerId,
        items: Option<Vec<ReservedItem>>,
    },
}
