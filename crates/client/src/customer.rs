//! Client for the customers service

use crate::participant::{ParticipantClient, ServiceChannel};
use crate::unexpected;
use travel_common::{Result, TransactionId};
use travel_customer::{CustomerId, CustomerOperation, CustomerResponse, ReservedItem};
use travel_protocol::{ServiceReply, ServiceRequest};
use travel_resource::ItemKind;

#[derive(Clone)]
pub struct CustomerClient {
    participant: ParticipantClient,
}

impl CustomerClient {
    pub fn new(channel: ServiceChannel) -> Self {
        Self {
            participant: ParticipantClient::new(channel),
        }
    }

    pub fn participant(&self) -> &ParticipantClient {
        &self.participant
    }

    pub fn new_customer(&self, txn: TransactionId) -> Result<CustomerId> {
        match self.execute(txn, CustomerOperation::NewCustomer)? {
            CustomerResponse::Created { customer } => Ok(customer),
            other => Err(unexpected(self.participant.name(), other)),
        }
    }

    pub fn new_customer_with_id(&self, txn: TransactionId, customer: CustomerId) -> Result<bool> {
        self.done(txn, CustomerOperation::NewCustomerWithId { customer })
    }

    pub fn delete_customer(&self, txn: TransactionId, customer: CustomerId) -> Result<bool> {
        self.done(txn, CustomerOperation::DeleteCustomer { customer })
    }

    pub fn reserve(
        &self,
        txn: TransactionId,
        customer: CustomerId,
        kind: ItemKind,
        id: &str,
        price: u32,
    ) -> Result<bool> {
        self.done(
            txn,
            CustomerOperation::Reserve {
                customer,
                kind,
                id: id.to_string(),
                price,
            },
        )
    }

    pub fn cancel_reservation(
        &self,
        txn: TransactionId,
        customer: CustomerId,
        kind: ItemKind,
        id: &str,
    ) -> Result<bool> {
        self.done(
            txn,
            CustomerOperation::CancelReservation {
                customer,
                kind,
                id: id.to_string(),
            },
        )
    }

    pub fn query_customer_info(&self, txn: TransactionId, customer: CustomerId) -> Result<String> {
        match self.execute(txn, CustomerOperation::QueryInfo { customer })? {
            CustomerResponse::Info { bill, .. } => Ok(bill),
            other => Err(unexpected(self.participant.name(), other)),
        }
    }

    pub fn reservations(
        &self,
        txn: TransactionId,
        customer: CustomerId,
    ) -> Result<Option<Vec<ReservedItem>>> {
        match self.execute(txn, CustomerOperation::Reservations { customer })? {
            CustomerResponse::Reservations { items, .. } => Ok(items),
            other => Err(unexpected(self.participant.name(), other)),
        }
    }

    /// Ledger entries under a write lock on the customer table
    pub fn reservations_for_update(
        &self,
        txn: TransactionId,
        customer: CustomerId,
    ) -> Result<Option<Vec<ReservedItem>>> {
        let operation = CustomerOperation::ReservationsForUpdate { customer };
        match self.execute(txn, operation)? {
            CustomerResponse::Reservations { items, .. } => Ok(items),
            other => Err(unexpected(self.participant.name(), other)),
        }
    }

    fn done(&self, txn: TransactionId, operation: CustomerOperation) -> Result<bool> {
        match self.execute(txn, operation)? {
            CustomerResponse::Done { done, .. } => Ok(done),
            other => Err(unexpected(self.participant.name(), other)),
        }
    }

    fn execute(
        &self,
        txn: TransactionId,
        operation: CustomerOperation,
    ) -> Result<CustomerResponse> {
        match self.participant.call(ServiceRequest::Customer { txn, operation })? {
            ServiceReply::Customer(response) => Ok(response),
            other => Err(unexpected(self.participant.name(), other)),
        }
    }
}
