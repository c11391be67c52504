//! Starting a service or the middleware on a TCP listener

use crate::config::{Role, ServerConfig};
use crate::error::{Result, ServerError};
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use travel_client::{CustomerClient, ResourceClient, ServiceChannel};
use travel_common::ServiceName;
use travel_coordinator::{CoordinatorConfig, LocalCluster, Participants, TransactionCoordinator};
use travel_crash::{CrashInjector, CrashSite};
use travel_customer::CustomerManager;
use travel_protocol::{
    CustomerService, MiddlewareReply, MiddlewareRequest, ResourceService, Service, ServiceReply,
    ServiceRequest, TcpChannel, TcpServer,
};
use travel_resource::{ItemKind, ResourceManager};

/// Run the configured role until the listener fails or the process is stopped
pub fn run(config: &ServerConfig) -> Result<()> {
    let coordinator_config =
        CoordinatorConfig::default().with_shutdown_grace(config.shutdown_grace());

    match config.role {
        Role::Flights => serve_resource(config, ItemKind::Flight),
        Role::Cars => serve_resource(config, ItemKind::Car),
        Role::Rooms => serve_resource(config, ItemKind::Room),
        Role::Customers => {
            let manager = Arc::new(CustomerManager::new());
            let service = Arc::new(CustomerService::new(manager));
            serve_participant(config, ServiceName::Customers, service)
        }
        Role::Middleware => {
            let resource = |kind: ItemKind| -> Result<ResourceClient> {
                Ok(ResourceClient::new(kind, connect(config, kind.service())?))
            };
            let participants = Participants {
                flights: resource(ItemKind::Flight)?,
                cars: resource(ItemKind::Car)?,
                rooms: resource(ItemKind::Room)?,
                customers: CustomerClient::new(connect(config, ServiceName::Customers)?),
            };
            let coordinator = TransactionCoordinator::new(
                participants,
                Arc::new(CrashInjector::new(CrashSite::Middleware)),
                coordinator_config,
            );
            serve_middleware(config, Arc::new(coordinator))
        }
        Role::All => {
            let cluster = LocalCluster::builder().with_config(coordinator_config).build();
            serve_middleware(config, cluster.coordinator().clone())
        }
    }
}

fn serve_resource(config: &ServerConfig, kind: ItemKind) -> Result<()> {
    let manager = Arc::new(ResourceManager::new(kind));
    serve_participant(config, kind.service(), Arc::new(ResourceService::new(manager)))
}

fn serve_participant(
    config: &ServerConfig,
    service: ServiceName,
    handler: Arc<dyn Service<ServiceRequest, ServiceReply>>,
) -> Result<()> {
    let server = TcpServer::bind(service.as_str(), config.listen_addr(), handler)?;
    server.serve()?;
    Ok(())
}

fn serve_middleware(config: &ServerConfig, coordinator: Arc<TransactionCoordinator>) -> Result<()> {
    let handler: Arc<dyn Service<MiddlewareRequest, MiddlewareReply>> = coordinator;
    let server = TcpServer::bind("middleware", config.listen_addr(), handler)?;
    server.serve()?;
    Ok(())
}

fn connect(config: &ServerConfig, service: ServiceName) -> Result<ServiceChannel> {
    let addr = resolve(&config.peer_addr(service))?;
    tracing::info!("Using {} at {}", service, addr);
    Ok(Arc::new(TcpChannel::<ServiceRequest, ServiceReply>::new(service.as_str(), addr)))
}

fn resolve(addr: &str) -> Result<SocketAddr> {
    addr.to_socket_addrs()?
        .next()
        .ok_or_else(|| ServerError::InvalidAddress(addr.to_string()))
}
