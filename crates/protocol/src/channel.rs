//! Call abstraction

use crate::error::Result;

/// Synchronous request/reply link to one service
pub trait Channel<Req, Rep>: Send + Sync {
    /// Name of the service at the other end
    fn name(&self) -> &str;

    fn call(&self, request: &Req) -> Result<Rep>;
}

/// Something that answers requests
pub trait Service<Req, Rep>: Send + Sync {
    fn handle(&self, request: Req) -> Rep;
}
