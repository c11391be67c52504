//! Client for a flights, cars or rooms service

use crate::participant::{ParticipantClient, ServiceChannel};
use crate::unexpected;
use travel_common::{Result, TransactionId};
use travel_protocol::{ServiceReply, ServiceRequest};
use travel_resource::{ItemKind, ResourceOperation, ResourceResponse};

#[derive(Clone)]
pub struct ResourceClient {
    kind: ItemKind,
    participant: ParticipantClient,
}

impl ResourceClient {
    pub fn new(kind: ItemKind, channel: ServiceChannel) -> Self {
        Self {
            kind,
            participant: ParticipantClient::new(channel),
        }
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn participant(&self) -> &ParticipantClient {
        &self.participant
    }

    pub fn add(&self, txn: TransactionId, id: &str, count: u32, price: u32) -> Result<bool> {
        let operation = ResourceOperation::Add {
            id: id.to_string(),
            count,
            price,
        };
        match self.execute(txn, operation)? {
            ResourceResponse::Added { .. } => Ok(true),
            other => Err(unexpected(self.participant.name(), other)),
        }
    }

    pub fn delete(&self, txn: TransactionId, id: &str) -> Result<bool> {
        match self.execute(txn, ResourceOperation::Delete { id: id.to_string() })? {
            ResourceResponse::Deleted { deleted, .. } => Ok(deleted),
            other => Err(unexpected(self.participant.name(), other)),
        }
    }

    pub fn query(&self, txn: TransactionId, id: &str) -> Result<u32> {
        match self.execute(txn, ResourceOperation::Query { id: id.to_string() })? {
            ResourceResponse::Count { count, .. } => Ok(count),
            other => Err(unexpected(self.participant.name(), other)),
        }
    }

    pub fn query_price(&self, txn: TransactionId, id: &str) -> Result<u32> {
        match self.execute(txn, ResourceOperation::QueryPrice { id: id.to_string() })? {
            ResourceResponse::Price { price, .. } => Ok(price),
            other => Err(unexpected(self.participant.name(), other)),
        }
    }

    pub fn query_reserved(&self, txn: TransactionId, id: &str) -> Result<u32> {
        match self.execute(txn, ResourceOperation::QueryReserved { id: id.to_string() })? {
            ResourceResponse::ReservedCount { reserved, .. } => Ok(reserved),
            other => Err(unexpected(self.participant.name(), other)),
        }
    }

    pub fn reserve(&self, txn: TransactionId, id: &str) -> Result<bool> {
        match self.execute(txn, ResourceOperation::Reserve { id: id.to_string() })? {
            ResourceResponse::Reserved { reserved, .. } => Ok(reserved),
            other => Err(unexpected(self.participant.name(), other)),
        }
    }

    pub fn release(&self, txn: TransactionId, id: &str, amount: u32) -> Result<bool> {
        let operation = ResourceOperation::Release {
            id: id.to_string(),
            amount,
        };
        match self.execute(txn, operation)? {
            ResourceResponse::Released { released, .. } => Ok(released),
            other => Err(unexpected(self.participant.name(), other)),
        }
    }

    fn execute(
        &self,
        txn: TransactionId,
        operation: ResourceOperation,
    ) -> Result<ResourceResponse> {
        match self.participant.call(ServiceRequest::Resource { txn, operation })? {
            ServiceReply::Resource(response) => Ok(response),
            other => Err(unexpected(self.participant.name(), other)),
        }
    }
}
