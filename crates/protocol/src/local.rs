//! In-process channel

use crate::channel::{Channel, Service};
use crate::error::{Result, TransportError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Connection state shared between a channel and whoever may cut it
#[derive(Debug, Clone)]
pub struct Link(Arc<AtomicBool>);

impl Link {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn disconnect(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn reconnect(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_connected(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Channel calling a service in the same process
///
/// Requests and replies still go through JSON, so a type that cannot cross
/// the wire fails here too. A disconnected channel behaves like a crashed
/// service.
pub struct LocalChannel<Req, Rep> {
    name: String,
    service: Arc<dyn Service<Req, Rep>>,
    link: Link,
}

impl<Req, Rep> LocalChannel<Req, Rep> {
    pub fn new(name: impl Into<String>, service: Arc<dyn Service<Req, Rep>>) -> Self {
        Self {
            name: name.into(),
            service,
            link: Link::new(),
        }
    }

    /// Handle that can cut this channel
    pub fn link(&self) -> Link {
        self.link.clone()
    }
}

impl<Req, Rep> Channel<Req, Rep> for LocalChannel<Req, Rep>
where
    Req: Serialize + DeserializeOwned,
    Rep: Serialize + DeserializeOwned,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, request: &Req) -> Result<Rep> {
        if !self.link.is_connected() {
            return Err(TransportError::Unavailable(self.name.clone()));
        }

        let request: Req = serde_json::from_str(&serde_json::to_string(request)?)?;
        let reply = self.service.handle(request);

        // The service may have gone down while handling the call
        if !self.link.is_connected() {
            return Err(TransportError::Unavailable(self.name.clone()));
        }
        Ok(serde_json::from_str(&serde_json::to_string(&reply)?)?)
    }
}
