//! Adapters exposing the managers as services

use crate::channel::Service;
use crate::messages::{ServiceReply, ServiceRequest, TransactionPhase};
use std::sync::Arc;
use std::time::Duration;
use travel_common::TransactionId;
use travel_crash::CrashInjector;
use travel_customer::CustomerManager;
use travel_resource::ResourceManager;

/// Flights, cars or rooms service
pub struct ResourceService {
    manager: Arc<ResourceManager>,
}

impl ResourceService {
    pub fn new(manager: Arc<ResourceManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Arc<ResourceManager> {
        &self.manager
    }
}

impl Service<ServiceRequest, ServiceReply> for ResourceService {
    fn handle(&self, request: ServiceRequest) -> ServiceReply {
        let manager = &self.manager;
        match request {
            ServiceRequest::Resource { txn, operation } => {
                ServiceReply::from_result(manager.execute(txn, &operation), ServiceReply::Resource)
            }
            ServiceRequest::Control { txn, phase } => control(txn, phase, |phase| match phase {
                TransactionPhase::Prepare => manager.prepare(txn),
                TransactionPhase::Commit => manager.commit(txn),
                TransactionPhase::Abort => manager.abort(txn),
            }),
            other => admin(manager.table().crash_injector(), other),
        }
    }
}

/// Customers service
pub struct CustomerService {
    manager: Arc<CustomerManager>,
}

impl CustomerService {
    pub fn new(manager: Arc<CustomerManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Arc<CustomerManager> {
        &self.manager
    }
}

impl Service<ServiceRequest, ServiceReply> for CustomerService {
    fn handle(&self, request: ServiceRequest) -> ServiceReply {
        let manager = &self.manager;
        match request {
            ServiceRequest::Customer { txn, operation } => {
                ServiceReply::from_result(manager.execute(txn, &operation), ServiceReply::Customer)
            }
            ServiceRequest::Control { txn, phase } => control(txn, phase, |phase| match phase {
                TransactionPhase::Prepare => manager.prepare(txn),
                TransactionPhase::Commit => manager.commit(txn),
                TransactionPhase::Abort => manager.abort(txn),
            }),
            other => admin(manager.table().crash_injector(), other),
        }
    }
}

fn control(
    txn: TransactionId,
    phase: TransactionPhase,
    apply: impl FnOnce(TransactionPhase) -> bool,
) -> ServiceReply {
    tracing::trace!("{} request for {}", phase.as_str(), txn);
    let outcome = apply(phase);
    match phase {
        TransactionPhase::Prepare => ServiceReply::Vote(outcome),
        TransactionPhase::Commit | TransactionPhase::Abort => ServiceReply::Done(outcome),
    }
}

fn admin(crash: &CrashInjector, request: ServiceRequest) -> ServiceReply {
    match request {
        ServiceRequest::InjectCrash { point } => ServiceReply::Done(crash.arm(point)),
        ServiceRequest::Crash => {
            crash.kill();
            ServiceReply::Done(true)
        }
        ServiceRequest::Shutdown { grace_ms } => {
            crash.shutdown_after(Duration::from_millis(grace_ms));
            ServiceReply::Done(true)
        }
        other => {
            tracing::warn!("{} cannot handle {:?}", crash.site(), other);
            ServiceReply::Done(false)
        }
    }
}
