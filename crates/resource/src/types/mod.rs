//! Type definitions for the resource managers

mod item;
mod operation;
mod response;

pub use item::{ItemKind, ReservableItem};
pub use operation::ResourceOperation;
pub use response::ResourceResponse;
