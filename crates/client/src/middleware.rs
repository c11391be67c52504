//! Client for the middleware

use crate::unexpected;
use std::sync::Arc;
use travel_common::{Result, TransactionId};
use travel_crash::{CrashPoint, CrashSite};
use travel_customer::CustomerId;
use travel_protocol::{Channel, MiddlewareReply, MiddlewareRequest};
use travel_resource::ItemKind;

pub type MiddlewareChannel = Arc<dyn Channel<MiddlewareRequest, MiddlewareReply>>;

/// End-user view of the travel system
#[derive(Clone)]
pub struct MiddlewareClient {
    channel: MiddlewareChannel,
}

impl MiddlewareClient {
    pub fn new(channel: MiddlewareChannel) -> Self {
        Self { channel }
    }

    fn call(&self, request: MiddlewareRequest) -> Result<MiddlewareReply> {
        match self.channel.call(&request)? {
            MiddlewareReply::Error(e) => Err(e),
            reply => Ok(reply),
        }
    }

    fn bool(&self, request: MiddlewareRequest) -> Result<bool> {
        match self.call(request)? {
            MiddlewareReply::Bool(b) => Ok(b),
            other => Err(unexpected(self.channel.name(), other)),
        }
    }

    fn count(&self, request: MiddlewareRequest) -> Result<u32> {
        match self.call(request)? {
            MiddlewareReply::Count(n) => Ok(n),
            other => Err(unexpected(self.channel.name(), other)),
        }
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    pub fn start(&self) -> Result<TransactionId> {
        match self.call(MiddlewareRequest::Start)? {
            MiddlewareReply::Started(txn) => Ok(txn),
            other => Err(unexpected(self.channel.name(), other)),
        }
    }

    pub fn prepare(&self, txn: TransactionId) -> Result<bool> {
        self.bool(MiddlewareRequest::Prepare { txn })
    }

    pub fn commit(&self, txn: TransactionId) -> Result<bool> {
        self.bool(MiddlewareRequest::Commit { txn })
    }

    pub fn abort(&self, txn: TransactionId) -> Result<bool> {
        self.bool(MiddlewareRequest::Abort { txn })
    }

    // ========================================================================
    // Inventory
    // ========================================================================

    pub fn add_item(
        &self,
        txn: TransactionId,
        kind: ItemKind,
        id: &str,
        count: u32,
        price: u32,
    ) -> Result<bool> {
        self.bool(MiddlewareRequest::AddItem {
            txn,
            kind,
            id: id.to_string(),
            count,
            price,
        })
    }

    pub fn add_flight(
        &self,
        txn: TransactionId,
        flight: u32,
        seats: u32,
        price: u32,
    ) -> Result<bool> {
        self.add_item(txn, ItemKind::Flight, &flight.to_string(), seats, price)
    }

    pub fn add_cars(
        &self,
        txn: TransactionId,
        location: &str,
        count: u32,
        price: u32,
    ) -> Result<bool> {
        self.add_item(txn, ItemKind::Car, location, count, price)
    }

    pub fn add_rooms(
        &self,
        txn: TransactionId,
        location: &str,
        count: u32,
        price: u32,
    ) -> Result<bool> {
        self.add_item(txn, ItemKind::Room, location, count, price)
    }

    pub fn delete_item(&self, txn: TransactionId, kind: ItemKind, id: &str) -> Result<bool> {
        self.bool(MiddlewareRequest::DeleteItem {
            txn,
            kind,
            id: id.to_string(),
        })
    }

    pub fn delete_flight(&self, txn: TransactionId, flight: u32) -> Result<bool> {
        self.delete_item(txn, ItemKind::Flight, &flight.to_string())
    }

    pub fn delete_cars(&self, txn: TransactionId, location: &str) -> Result<bool> {
        self.delete_item(txn, ItemKind::Car, location)
    }

    pub fn delete_rooms(&self, txn: TransactionId, location: &str) -> Result<bool> {
        self.delete_item(txn, ItemKind::Room, location)
    }

    pub fn query_item(&self, txn: TransactionId, kind: ItemKind, id: &str) -> Result<u32> {
        self.count(MiddlewareRequest::QueryItem {
            txn,
            kind,
            id: id.to_string(),
        })
    }

    pub fn query_flight(&self, txn: TransactionId, flight: u32) -> Result<u32> {
        self.query_item(txn, ItemKind::Flight, &flight.to_string())
    }

    pub fn query_cars(&self, txn: TransactionId, location: &str) -> Result<u32> {
        self.query_item(txn, ItemKind::Car, location)
    }

    pub fn query_rooms(&self, txn: TransactionId, location: &str) -> Result<u32> {
        self.query_item(txn, ItemKind::Room, location)
    }

    pub fn query_price(&self, txn: TransactionId, kind: ItemKind, id: &str) -> Result<u32> {
        self.count(MiddlewareRequest::QueryPrice {
            txn,
            kind,
            id: id.to_string(),
        })
    }

    pub fn query_flight_price(&self, txn: TransactionId, flight: u32) -> Result<u32> {
        self.query_price(txn, ItemKind::Flight, &flight.to_string())
    }

    pub fn query_cars_price(&self, txn: TransactionId, location: &str) -> Result<u32> {
        self.query_price(txn, ItemKind::Car, location)
    }

    pub fn query_rooms_price(&self, txn: TransactionId, location: &str) -> Result<u32> {
        self.query_price(txn, ItemKind::Room, location)
    }

    // ========================================================================
    // Customers
    // ========================================================================

    pub fn new_customer(&self, txn: TransactionId) -> Result<CustomerId> {
        match self.call(MiddlewareRequest::NewCustomer { txn })? {
            MiddlewareReply::Customer(customer) => Ok(customer),
            other => Err(unexpected(self.channel.name(), other)),
        }
    }

    pub fn new_customer_with_id(&self, txn: TransactionId, customer: CustomerId) -> Result<bool> {
        self.bool(MiddlewareRequest::NewCustomerWithId { txn, customer })
    }

    pub fn delete_customer(&self, txn: TransactionId, customer: CustomerId) -> Result<bool> {
        self.bool(MiddlewareRequest::DeleteCustomer { txn, customer })
    }

    pub fn query_customer_info(&self, txn: TransactionId, customer: CustomerId) -> Result<String> {
        match self.call(MiddlewareRequest::QueryCustomerInfo { txn, customer })? {
            MiddlewareReply::Text(bill) => Ok(bill),
            other => Err(unexpected(self.channel.name(), other)),
        }
    }

    pub fn reserve(
        &self,
        txn: TransactionId,
        customer: CustomerId,
        kind: ItemKind,
        id: &str,
    ) -> Result<bool> {
        self.bool(MiddlewareRequest::Reserve {
            txn,
            customer,
            kind,
            id: id.to_string(),
        })
    }

    pub fn reserve_flight(
        &self,
        txn: TransactionId,
        customer: CustomerId,
        flight: u32,
    ) -> Result<bool> {
        self.reserve(txn, customer, ItemKind::Flight, &flight.to_string())
    }

    pub fn reserve_car(
        &self,
        txn: TransactionId,
        customer: CustomerId,
        location: &str,
    ) -> Result<bool> {
        self.reserve(txn, customer, ItemKind::Car, location)
    }

    pub fn reserve_room(
        &self,
        txn: TransactionId,
        customer: CustomerId,
        location: &str,
    ) -> Result<bool> {
        self.reserve(txn, customer, ItemKind::Room, location)
    }

    pub fn bundle(
        &self,
        txn: TransactionId,
        customer: CustomerId,
        flights: &[u32],
        location: &str,
        car: bool,
        room: bool,
    ) -> Result<bool> {
        self.bool(MiddlewareRequest::Bundle {
            txn,
            customer,
            flights: flights.iter().map(|f| f.to_string()).collect(),
            location: location.to_string(),
            car,
            room,
        })
    }

    // ========================================================================
    // Administration
    // ========================================================================

    pub fn inject_crash(&self, site: CrashSite, point: CrashPoint) -> Result<bool> {
        self.bool(MiddlewareRequest::InjectCrash { site, point })
    }

    pub fn crash(&self, site: CrashSite) -> Result<bool> {
        self.bool(MiddlewareRequest::Crash { site })
    }

    pub fn shutdown(&self) -> Result<bool> {
        self.bool(MiddlewareRequest::Shutdown)
    }
}
