//! Server command line

use clap::{Parser, ValueEnum};
use std::time::Duration;
use travel_common::ServiceName;

/// Which process to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Role {
    Flights,
    Cars,
    Rooms,
    Customers,
    Middleware,
    /// Every service and the middleware in one process
    All,
}

impl Role {
    /// Port used when none is given
    pub fn default_port(&self) -> u16 {
        match self {
            Role::Middleware | Role::All => 5000,
            Role::Flights => service_port(ServiceName::Flights),
            Role::Cars => service_port(ServiceName::Cars),
            Role::Rooms => service_port(ServiceName::Rooms),
            Role::Customers => service_port(ServiceName::Customers),
        }
    }
}

/// Default port of a participant service
pub fn service_port(service: ServiceName) -> u16 {
    match service {
        ServiceName::Flights => 5001,
        ServiceName::Cars => 5002,
        ServiceName::Rooms => 5003,
        ServiceName::Customers => 5004,
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "travel-server")]
#[command(about = "Travel reservation services and two-phase commit middleware")]
#[command(version)]
pub struct ServerConfig {
    /// Process to run
    #[arg(short, long, value_enum)]
    pub role: Role,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on (defaults to 5000 for the middleware, 5001-5004 for the services)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Flights service address, for the middleware
    #[arg(long)]
    pub flights: Option<String>,

    /// Cars service address, for the middleware
    #[arg(long)]
    pub cars: Option<String>,

    /// Rooms service address, for the middleware
    #[arg(long)]
    pub rooms: Option<String>,

    /// Customers service address, for the middleware
    #[arg(long)]
    pub customers: Option<String>,

    /// Delay before exiting after a shutdown request
    #[arg(long, default_value_t = 500)]
    pub shutdown_grace_ms: u64,
}

impl ServerConfig {
    /// Address this process listens on
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port.unwrap_or(self.role.default_port()))
    }

    /// Where the middleware finds a service
    pub fn peer_addr(&self, service: ServiceName) -> String {
        let configured = match service {
            ServiceName::Flights => &self.flights,
            ServiceName::Cars => &self.cars,
            ServiceName::Rooms => &self.rooms,
            ServiceName::Customers => &self.customers,
        };
        configured
            .clone()
            .unwrap_or_else(|| format!("{}:{}", self.host, service_port(service)))
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::parse_from(["travel-server", "--role", "middleware"]);
        assert_eq!(config.role, Role::Middleware);
        assert_eq!(config.listen_addr(), "127.0.0.1:5000");
        assert_eq!(config.peer_addr(ServiceName::Rooms), "127.0.0.1:5003");
        assert_eq!(config.shutdown_grace(), Duration::from_millis(500));
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::parse_from([
            "travel-server",
            "--role",
            "cars",
            "--host",
            "0.0.0.0",
            "--port",
            "7000",
            "--flights",
            "10.0.0.5:6001",
        ]);
        assert_eq!(config.role, Role::Cars);
        assert_eq!(config.listen_addr(), "0.0.0.0:7000");
        assert_eq!(config.peer_addr(ServiceName::Flights), "10.0.0.5:6001");
        assert_eq!(config.peer_addr(ServiceName::Cars), "0.0.0.0:5002");
    }
}
