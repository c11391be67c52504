//! Integration tests for the customer manager

use std::sync::Arc;
use std::time::Duration;
use travel_common::{Error, ServiceName, TransactionId};
use travel_crash::{CrashInjector, CrashSite, RecordingTerminator};
use travel_customer::{CustomerManager, CustomerOperation, CustomerResponse};
use travel_lock::{LockManager, LockMode};
use travel_resource::ItemKind;

fn manager() -> CustomerManager {
    CustomerManager::with_parts(
        LockManager::with_timeout(Duration::from_millis(200)),
        Arc::new(CrashInjector::with_terminator(
            CrashSite::Service(ServiceName::Customers),
            Arc::new(RecordingTerminator::new()),
        )),
    )
}

fn txn(n: u64) -> TransactionId {
    TransactionId::new(n)
}

#[test]
fn test_generated_ids_are_distinct() {
    let cm = manager();
    let t = txn(12);

    let ids: Vec<_> = (0..50).map(|_| cm.new_customer(t).unwrap()).collect();
    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), ids.len());

    // Transaction id leads the digits
    assert!(ids.iter().all(|id| id / 1_000_000 == 12));
}

#[test]
fn test_saturated_ids_still_find_a_free_slot() {
    let cm = manager();
    let t = txn(u64::MAX);

    // Every generated candidate saturates to the same value
    assert!(cm.new_customer_with_id(t, u64::MAX).unwrap());

    let first = cm.new_customer(t).unwrap();
    let second = cm.new_customer(t).unwrap();
    assert_eq!(first, u64::MAX - 1);
    assert_eq!(second, u64::MAX - 2);
    assert_eq!(cm.query_customer_info(t, first).unwrap(), format!("Bill for customer {}\n", first));
}

#[test]
fn test_new_customer_with_id() {
    let cm = manager();
    let t = txn(1);

    assert!(cm.new_customer_with_id(t, 5).unwrap());
    assert!(!cm.new_customer_with_id(t, 5).unwrap());
    assert_eq!(cm.query_customer_info(t, 5).unwrap(), "Bill for customer 5\n");
}

#[test]
fn test_reserve_requires_customer() {
    let cm = manager();
    let t = txn(1);

    assert!(!cm.reserve(t, 9, ItemKind::Flight, "100", 10).unwrap());
    assert!(!cm.cancel_reservation(t, 9, ItemKind::Flight, "100").unwrap());
    assert_eq!(cm.query_customer_info(t, 9).unwrap(), "");
    assert_eq!(cm.reservations(t, 9).unwrap(), None);
}

#[test]
fn test_ledger_round_trip() {
    let cm = manager();
    let t = txn(1);
    cm.new_customer_with_id(t, 1).unwrap();

    assert!(cm.reserve(t, 1, ItemKind::Flight, "100", 10).unwrap());
    assert!(cm.reserve(t, 1, ItemKind::Flight, "100", 10).unwrap());
    assert!(cm.reserve(t, 1, ItemKind::Room, "Oslo", 90).unwrap());
    assert!(cm.cancel_reservation(t, 1, ItemKind::Room, "oslo").unwrap());

    let items = cm.reservations(t, 1).unwrap().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].key, "flight-100");
    assert_eq!(items[0].amount, 2);

    assert_eq!(
        cm.query_customer_info(t, 1).unwrap(),
        "Bill for customer 1\n2 flight-100 $10\n"
    );
}

#[test]
fn test_abort_restores_ledger() {
    let cm = manager();
    let seed = txn(1);
    cm.new_customer_with_id(seed, 1).unwrap();
    cm.reserve(seed, 1, ItemKind::Car, "paris", 30).unwrap();
    assert!(cm.commit(seed));

    let t = txn(2);
    assert!(cm.delete_customer(t, 1).unwrap());
    assert!(cm.new_customer_with_id(t, 2).unwrap());
    assert!(cm.abort(t));

    let fresh = txn(3);
    assert_eq!(
        cm.query_customer_info(fresh, 1).unwrap(),
        "Bill for customer 1\n1 car-paris $30\n"
    );
    assert_eq!(cm.query_customer_info(fresh, 2).unwrap(), "");
}

#[test]
fn test_execute_dispatch() {
    let cm = manager();
    let t = txn(3);

    let customer = match cm.execute(t, &CustomerOperation::NewCustomer).unwrap() {
        CustomerResponse::Created { customer } => customer,
        _ => panic!("Expected Created response"),
    };

    let op = CustomerOperation::Reserve {
        customer,
        kind: ItemKind::Car,
        id: "lyon".to_string(),
        price: 20,
    };
    assert_eq!(
        cm.execute(t, &op).unwrap(),
        CustomerResponse::Done {
            customer,
            done: true
        }
    );

    match cm
        .execute(t, &CustomerOperation::Reservations { customer })
        .unwrap()
    {
        CustomerResponse::Reservations { items: Some(items), .. } => {
            assert_eq!(items[0].kind, ItemKind::Car);
        }
        _ => panic!("Expected Reservations response"),
    }

    let json = serde_json::to_string(&op).unwrap();
    let parsed: CustomerOperation = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, op);
}

#[test]
fn test_reservations_for_update_takes_write_lock() {
    let cm = manager();
    let t = txn(1);
    assert!(cm.new_customer_with_id(t, 4).unwrap());
    assert!(cm.commit(t));

    let t2 = txn(2);
    assert_eq!(cm.reservations_for_update(t2, 4).unwrap(), Some(Vec::new()));
    assert_eq!(cm.reservations_for_update(t2, 8).unwrap(), None);
    assert_eq!(
        cm.table().lock_manager().locks_held_by(t2),
        vec![("customers".to_string(), LockMode::Write)]
    );

    let t3 = txn(3);
    assert!(matches!(cm.reservations(t3, 4), Err(Error::Deadlock { .. })));
}

