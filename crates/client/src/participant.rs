//! Control calls every participant answers

use crate::unexpected;
use std::sync::Arc;
use std::time::Duration;
use travel_common::{Error, Result, TransactionId};
use travel_crash::CrashPoint;
use travel_protocol::{Channel, ServiceReply, ServiceRequest, TransactionPhase};

pub type ServiceChannel = Arc<dyn Channel<ServiceRequest, ServiceReply>>;

/// 2PC and administrative calls on one service
#[derive(Clone)]
pub struct ParticipantClient {
    channel: ServiceChannel,
}

impl ParticipantClient {
    pub fn new(channel: ServiceChannel) -> Self {
        Self { channel }
    }

    pub fn name(&self) -> &str {
        self.channel.name()
    }

    /// Send a request and unwrap error replies
    pub(crate) fn call(&self, request: ServiceRequest) -> Result<ServiceReply> {
        match self.channel.call(&request)? {
            ServiceReply::Error(e) => Err(e),
            reply => Ok(reply),
        }
    }

    pub fn prepare(&self, txn: TransactionId) -> Result<bool> {
        match self.control(txn, TransactionPhase::Prepare)? {
            ServiceReply::Vote(vote) => Ok(vote),
            other => Err(unexpected(self.name(), other)),
        }
    }

    pub fn commit(&self, txn: TransactionId) -> Result<bool> {
        self.decision(txn, TransactionPhase::Commit)
    }

    pub fn abort(&self, txn: TransactionId) -> Result<bool> {
        self.decision(txn, TransactionPhase::Abort)
    }

    /// Arm a crash point on the service
    pub fn inject_crash(&self, point: CrashPoint) -> Result<bool> {
        self.done(ServiceRequest::InjectCrash { point })
    }

    /// Kill the service; an unanswered call counts as success
    pub fn crash(&self) -> Result<bool> {
        match self.done(ServiceRequest::Crash) {
            Err(Error::Unavailable(_)) => Ok(true),
            other => other,
        }
    }

    pub fn shutdown(&self, grace: Duration) -> Result<bool> {
        self.done(ServiceRequest::Shutdown {
            grace_ms: grace.as_millis() as u64,
        })
    }

    fn control(&self, txn: TransactionId, phase: TransactionPhase) -> Result<ServiceReply> {
        self.call(ServiceRequest::Control { txn, phase })
    }

    fn decision(&self, txn: TransactionId, phase: TransactionPhase) -> Result<bool> {
        match self.control(txn, phase)? {
            ServiceReply::Done(done) => Ok(done),
            other => Err(unexpected(self.name(), other)),
        }
    }

    fn done(&self, request: ServiceRequest) -> Result<bool> {
        match self.call(request)? {
            ServiceReply::Done(done) => Ok(done),
            other => Err(unexpected(self.name(), other)),
        }
    }
}
