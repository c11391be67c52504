mod customer;
mod operation;
mod response;

pub use customer::{Customer, CustomerId, ReservedItem};
pub use operation::CustomerOperation;
pub use response::CustomerResponse;
