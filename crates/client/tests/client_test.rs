//! Typed clients against real services over local channels

use std::sync::Arc;
use std::time::Duration;
use travel_client::{CustomerClient, ResourceClient};
use travel_common::{Error, ServiceName, TransactionId};
use travel_crash::{CrashInjector, CrashSite, RecordingTerminator};
use travel_customer::CustomerManager;
use travel_lock::LockManager;
use travel_protocol::{CustomerService, LocalChannel, ResourceService, ServiceReply, ServiceRequest};
use travel_resource::{ItemKind, ResourceManager};

fn injector(service: ServiceName) -> Arc<CrashInjector> {
    Arc::new(CrashInjector::with_terminator(
        CrashSite::Service(service),
        Arc::new(RecordingTerminator::new()),
    ))
}

fn cars() -> (ResourceClient, travel_protocol::Link) {
    let manager = ResourceManager::with_parts(
        ItemKind::Car,
        LockManager::with_timeout(Duration::from_millis(100)),
        injector(ServiceName::Cars),
    );
    let channel: LocalChannel<ServiceRequest, ServiceReply> =
        LocalChannel::new("cars", Arc::new(ResourceService::new(Arc::new(manager))));
    let link = channel.link();
    (ResourceClient::new(ItemKind::Car, Arc::new(channel)), link)
}

#[test]
fn test_resource_client() {
    let (client, _) = cars();
    let t = TransactionId::new(1);

    assert!(client.add(t, "Paris", 2, 40).unwrap());
    assert_eq!(client.query(t, "paris").unwrap(), 2);
    assert_eq!(client.query_price(t, "paris").unwrap(), 40);
    assert!(client.reserve(t, "paris").unwrap());
    assert_eq!(client.query_reserved(t, "paris").unwrap(), 1);
    assert!(client.release(t, "paris", 1).unwrap());
    assert!(!client.delete(t, "paris").unwrap());

    assert!(client.participant().prepare(t).unwrap());
    assert!(client.participant().commit(t).unwrap());
}

#[test]
fn test_errors_surface_as_errors() {
    let (client, link) = cars();
    let t = TransactionId::new(1);
    client.add(t, "rome", 1, 1).unwrap();
    client.participant().abort(t).unwrap();

    match client.query(t, "rome") {
        Err(Error::InvalidTransaction(txn)) => assert_eq!(txn, t),
        other => panic!("Expected InvalidTransaction, got {:?}", other),
    }

    link.disconnect();
    match client.query(TransactionId::new(2), "rome") {
        Err(Error::Unavailable(name)) => assert_eq!(name, "cars"),
        other => panic!("Expected Unavailable, got {:?}", other),
    }
    assert!(client.participant().crash().unwrap());
}

#[test]
fn test_customer_client() {
    let manager = CustomerManager::with_parts(
        LockManager::with_timeout(Duration::from_millis(100)),
        injector(ServiceName::Customers),
    );
    let channel: LocalChannel<ServiceRequest, ServiceReply> = LocalChannel::new(
        "customers",
        Arc::new(CustomerService::new(Arc::new(manager))),
    );
    let client = CustomerClient::new(Arc::new(channel));
    let t = TransactionId::new(4);

    let customer = client.new_customer(t).unwrap();
    assert!(client.reserve(t, customer, ItemKind::Flight, "12", 300).unwrap());
    assert!(client.reserve(t, customer, ItemKind::Flight, "12", 300).unwrap());
    assert!(client.cancel_reservation(t, customer, ItemKind::Flight, "12").unwrap());

    let items = client.reservations(t, customer).unwrap().unwrap();
    assert_eq!(items[0].amount, 1);
    assert_eq!(
        client.query_customer_info(t, customer).unwrap(),
        format!("Bill for customer {}\n1 flight-12 $300\n", customer)
    );

    assert!(client.delete_customer(t, customer).unwrap());
    assert_eq!(client.reservations(t, customer).unwrap(), None);
}
