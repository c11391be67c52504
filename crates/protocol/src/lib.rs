//! Protocol between the middleware and the participant services
//!
//! Every call is a typed request answered by a typed reply over a
//! synchronous [`Channel`]. Requests and replies are JSON on the wire; the
//! in-process channel round-trips them through the same codec.

pub mod channel;
pub mod error;
pub mod local;
pub mod messages;
pub mod service;
pub mod tcp;

pub use channel::{Channel, Service};
pub use error::TransportError;
pub use local::{LocalChannel, Link};
pub use messages::{
    MiddlewareReply, MiddlewareRequest, ServiceReply, ServiceRequest, TransactionPhase,
};
pub use service::{CustomerService, ResourceService};
pub use tcp::{TcpChannel, TcpServer};
