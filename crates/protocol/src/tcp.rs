//! Newline-delimited JSON over TCP
//!
//! One connection carries exactly one request line and one reply line. The
//! server answers each connection on its own thread.

use crate::channel::{Channel, Service};
use crate::error::{Result, TransportError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::{self, BufRead, BufReader, Write};
use std::marker::PhantomData;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Default limit on connecting to and hearing back from a service
///
/// Longer than the deadlock timeout so a blocked call can still report
/// its deadlock.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Serves one [`Service`] on a TCP listener
pub struct TcpServer<Req, Rep> {
    name: String,
    listener: TcpListener,
    service: Arc<dyn Service<Req, Rep>>,
}

impl<Req, Rep> TcpServer<Req, Rep>
where
    Req: DeserializeOwned + Send + 'static,
    Rep: Serialize + Send + 'static,
{
    pub fn bind(
        name: impl Into<String>,
        addr: impl ToSocketAddrs,
        service: Arc<dyn Service<Req, Rep>>,
    ) -> io::Result<Self> {
        Ok(Self {
            name: name.into(),
            listener: TcpListener::bind(addr)?,
            service,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until the listener fails
    pub fn serve(self) -> io::Result<()> {
        tracing::info!("{} listening on {}", self.name, self.listener.local_addr()?);

        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    let service = self.service.clone();
                    let name = self.name.clone();
                    std::thread::spawn(move || {
                        if let Err(e) = answer(stream, service.as_ref()) {
                            tracing::warn!("{} failed to answer a call: {}", name, e);
                        }
                    });
                }
                Err(e) => tracing::warn!("{} failed to accept a connection: {}", self.name, e),
            }
        }
        Ok(())
    }

    /// Serve from a background thread
    pub fn spawn(self) -> io::Result<JoinHandle<io::Result<()>>> {
        std::thread::Builder::new()
            .name(format!("{}-server", self.name))
            .spawn(move || self.serve())
    }
}

fn answer<Req, Rep>(stream: TcpStream, service: &dyn Service<Req, Rep>) -> Result<()>
where
    Req: DeserializeOwned,
    Rep: Serialize,
{
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut line = String::new();
    reader.read_line(&mut line)?;

    let request: Req = serde_json::from_str(line.trim_end())?;
    let reply = service.handle(request);

    let mut writer = stream;
    let mut payload = serde_json::to_vec(&reply)?;
    payload.push(b'\n');
    writer.write_all(&payload)?;
    writer.flush()?;
    Ok(())
}

/// Client side of a [`TcpServer`]
pub struct TcpChannel<Req, Rep> {
    name: String,
    addr: SocketAddr,
    timeout: Duration,
    _marker: PhantomData<fn(&Req) -> Rep>,
}

impl<Req, Rep> TcpChannel<Req, Rep> {
    pub fn new(name: impl Into<String>, addr: SocketAddr) -> Self {
        Self {
            name: name.into(),
            addr,
            timeout: DEFAULT_CALL_TIMEOUT,
            _marker: PhantomData,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl<Req, Rep> Channel<Req, Rep> for TcpChannel<Req, Rep>
where
    Req: Serialize,
    Rep: DeserializeOwned,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, request: &Req) -> Result<Rep> {
        let unavailable = |e: io::Error| {
            tracing::debug!("{} unreachable at {}: {}", self.name, self.addr, e);
            TransportError::Unavailable(self.name.clone())
        };

        let mut stream = TcpStream::connect_timeout(&self.addr, self.timeout).map_err(unavailable)?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        let mut payload = serde_json::to_vec(request)?;
        payload.push(b'\n');
        stream.write_all(&payload).map_err(unavailable)?;
        stream.flush()?;

        let mut line = String::new();
        let read = BufReader::new(stream).read_line(&mut line).map_err(unavailable)?;
        if read == 0 {
            // Closed without a reply: the service died handling the call
            return Err(TransportError::Unavailable(self.name.clone()));
        }
        Ok(serde_json::from_str(line.trim_end())?)
    }
}
