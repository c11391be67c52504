//! Typed clients over protocol channels
//!
//! The middleware talks to the participants through [`ResourceClient`] and
//! [`CustomerClient`]; end users talk to the middleware through
//! [`MiddlewareClient`].

mod customer;
mod middleware;
mod participant;
mod resource;

pub use customer::CustomerClient;
pub use middleware::{MiddlewareChannel, MiddlewareClient};
pub use participant::{ParticipantClient, ServiceChannel};
pub use resource::ResourceClient;

use travel_common::Error;

fn unexpected(service: &str, reply: impl std::fmt::Debug) -> Error {
    tracing::warn!("Unexpected reply from {}: {:?}", service, reply);
    Error::Transport(format!("Unexpected reply from {}", service))
}
