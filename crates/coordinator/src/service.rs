//! The coordinator as a service answering middleware requests

use crate::coordinator::TransactionCoordinator;
use travel_protocol::{MiddlewareReply, MiddlewareRequest, Service};

impl Service<MiddlewareRequest, MiddlewareReply> for TransactionCoordinator {
    fn handle(&self, request: MiddlewareRequest) -> MiddlewareReply {
        use MiddlewareReply as Reply;
        use MiddlewareRequest as Request;

        match request {
            Request::Start => Reply::Started(self.start()),
            Request::Prepare { txn } => Reply::from_result(self.prepare(txn), Reply::Bool),
            Request::Commit { txn } => Reply::from_result(self.commit(txn), Reply::Bool),
            Request::Abort { txn } => Reply::from_result(self.abort(txn), Reply::Bool),
            Request::AddItem {
                txn,
                kind,
                id,
                count,
                price,
            } => Reply::from_result(self.add_item(txn, kind, &id, count, price), Reply::Bool),
            Request::DeleteItem { txn, kind, id } => {
                Reply::from_result(self.delete_item(txn, kind, &id), Reply::Bool)
            }
            Request::QueryItem { txn, kind, id } => {
                Reply::from_result(self.query_item(txn, kind, &id), Reply::Count)
            }
            Request::QueryPrice { txn, kind, id } => {
                Reply::from_result(self.query_price(txn, kind, &id), Reply::Count)
            }
            Request::NewCustomer { txn } => {
                Reply::from_result(self.new_customer(txn), Reply::Customer)
            }
            Request::NewCustomerWithId { txn, customer } => {
                Reply::from_result(self.new_customer_with_id(txn, customer), Reply::Bool)
            }
            Request::DeleteCustomer { txn, customer } => {
                Reply::from_result(self.delete_customer(txn, customer), Reply::Bool)
            }
            Request::QueryCustomerInfo { txn, customer } => {
                Reply::from_result(self.query_customer_info(txn, customer), Reply::Text)
            }
            Request::Reserve {
                txn,
                customer,
                kind,
                id,
            } => Reply::from_result(self.reserve_item(txn, customer, kind, &id), Reply::Bool),
            Request::Bundle {
                txn,
                customer,
                flights,
                location,
                car,
                room,
            } => Reply::from_result(
                self.bundle(txn, customer, &flights, &location, car, room),
                Reply::Bool,
            ),
            Request::InjectCrash { site, point } => {
                Reply::from_result(self.inject_crash(site, point), Reply::Bool)
            }
            Request::Crash { site } => Reply::from_result(self.crash(site), Reply::Bool),
            Request::Shutdown => Reply::from_result(self.shutdown(), Reply::Bool),
        }
    }
}
