//! Every service and the middleware in one process
//!
//! Services are reached through [`LocalChannel`]s, so requests still cross
//! the JSON codec. Cutting a service's [`Link`] makes it unreachable the way a
//! crashed process would be.

use crate::config::CoordinatorConfig;
use crate::coordinator::{Participants, TransactionCoordinator};
use std::sync::Arc;
use std::time::Duration;
use travel_client::{CustomerClient, MiddlewareClient, ResourceClient, ServiceChannel};
use travel_common::ServiceName;
use travel_crash::{CrashInjector, CrashSite, ProcessTerminator, Terminator};
use travel_customer::CustomerManager;
use travel_lock::{DEADLOCK_TIMEOUT, LockManager};
use travel_protocol::{
    CustomerService, LocalChannel, Link, MiddlewareReply, MiddlewareRequest, ResourceService,
    ServiceReply, ServiceRequest,
};
use travel_resource::{ItemKind, ResourceManager};

/// Builder for [`LocalCluster`]
pub struct ClusterBuilder {
    lock_timeout: Duration,
    terminator: Arc<dyn Terminator>,
    config: CoordinatorConfig,
}

impl Default for ClusterBuilder {
    fn default() -> Self {
        Self {
            lock_timeout: DEADLOCK_TIMEOUT,
            terminator: Arc::new(ProcessTerminator),
            config: CoordinatorConfig::default(),
        }
    }
}

impl ClusterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deadlock timeout of every service's lock manager
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// How every crash injector in the cluster terminates
    pub fn with_terminator(mut self, terminator: Arc<dyn Terminator>) -> Self {
        self.terminator = terminator;
        self
    }

    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> LocalCluster {
        let injector = |site: CrashSite| {
            Arc::new(CrashInjector::with_terminator(site, self.terminator.clone()))
        };

        let resource = |kind: ItemKind| {
            let service = kind.service();
            let manager = Arc::new(ResourceManager::with_parts(
                kind,
                LockManager::with_timeout(self.lock_timeout),
                injector(CrashSite::Service(service)),
            ));
            let channel: LocalChannel<ServiceRequest, ServiceReply> = LocalChannel::new(
                service.as_str(),
                Arc::new(ResourceService::new(manager.clone())),
            );
            let link = channel.link();
            let channel: ServiceChannel = Arc::new(channel);
            (manager, link, ResourceClient::new(kind, channel))
        };

        let (flights, flights_link, flights_client) = resource(ItemKind::Flight);
        let (cars, cars_link, cars_client) = resource(ItemKind::Car);
        let (rooms, rooms_link, rooms_client) = resource(ItemKind::Room);

        let customers = Arc::new(CustomerManager::with_parts(
            LockManager::with_timeout(self.lock_timeout),
            injector(CrashSite::Service(ServiceName::Customers)),
        ));
        let channel: LocalChannel<ServiceRequest, ServiceReply> = LocalChannel::new(
            ServiceName::Customers.as_str(),
            Arc::new(CustomerService::new(customers.clone())),
        );
        let customers_link = channel.link();

        let participants = Participants {
            flights: flights_client,
            cars: cars_client,
            rooms: rooms_client,
            customers: CustomerClient::new(Arc::new(channel)),
        };
        let coordinator = Arc::new(TransactionCoordinator::new(
            participants,
            injector(CrashSite::Middleware),
            self.config.clone(),
        ));

        LocalCluster {
            coordinator,
            flights,
            cars,
            rooms,
            customers,
            links: [flights_link, cars_link, rooms_link, customers_link],
        }
    }
}

/// The whole travel system wired over in-process channels
pub struct LocalCluster {
    coordinator: Arc<TransactionCoordinator>,
    flights: Arc<ResourceManager>,
    cars: Arc<ResourceManager>,
    rooms: Arc<ResourceManager>,
    customers: Arc<CustomerManager>,
    /// In [`ServiceName::ALL`] order
    links: [Link; 4],
}

impl LocalCluster {
    pub fn builder() -> ClusterBuilder {
        ClusterBuilder::new()
    }

    pub fn coordinator(&self) -> &Arc<TransactionCoordinator> {
        &self.coordinator
    }

    /// Direct access to a resource manager, bypassing the middleware
    pub fn resource(&self, kind: ItemKind) -> &Arc<ResourceManager> {
        match kind {
            ItemKind::Flight => &self.flights,
            ItemKind::Car => &self.cars,
            ItemKind::Room => &self.rooms,
        }
    }

    pub fn customers(&self) -> &Arc<CustomerManager> {
        &self.customers
    }

    /// Connection from the middleware to a service
    pub fn link(&self, service: ServiceName) -> &Link {
        let index = match service {
            ServiceName::Flights => 0,
            ServiceName::Cars => 1,
            ServiceName::Rooms => 2,
            ServiceName::Customers => 3,
        };
        &self.links[index]
    }

    /// Client talking to the middleware through the codec
    pub fn client(&self) -> MiddlewareClient {
        let channel: LocalChannel<MiddlewareRequest, MiddlewareReply> =
            LocalChannel::new("middleware", self.coordinator.clone());
        MiddlewareClient::new(Arc::new(channel))
    }
}
