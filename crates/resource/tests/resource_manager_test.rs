//! Integration tests for resource managers

use std::sync::Arc;
use std::time::Duration;
use travel_common::{Error, ServiceName, TransactionId};
use travel_crash::{CrashInjector, CrashSite, RecordingTerminator};
use travel_lock::LockManager;
use travel_resource::{ItemKind, ResourceManager, ResourceOperation, ResourceResponse};

fn manager(kind: ItemKind) -> ResourceManager {
    let site = CrashSite::Service(kind.service());
    ResourceManager::with_parts(
        kind,
        LockManager::with_timeout(Duration::from_millis(200)),
        Arc::new(CrashInjector::with_terminator(
            site,
            Arc::new(RecordingTerminator::new()),
        )),
    )
}

fn txn(n: u64) -> TransactionId {
    TransactionId::new(n)
}

/// Seed an item in its own committed transaction
fn seed(rm: &ResourceManager, t: TransactionId, id: &str, count: u32, price: u32) {
    assert!(rm.add(t, id, count, price).unwrap());
    assert!(rm.prepare(t));
    assert!(rm.commit(t));
}

// ============================================================================
// Inventory operations
// ============================================================================

#[test]
fn test_add_and_query() {
    let rm = manager(ItemKind::Flight);
    seed(&rm, txn(1), "100", 5, 10);

    let t = txn(2);
    assert_eq!(rm.query(t, "100").unwrap(), 5);
    assert_eq!(rm.query_price(t, "100").unwrap(), 10);
    assert_eq!(rm.query_reserved(t, "100").unwrap(), 0);
    rm.commit(t);
}

#[test]
fn test_add_existing_item() {
    let rm = manager(ItemKind::Car);
    seed(&rm, txn(1), "Montreal", 5, 30);

    // Zero price keeps the old one
    seed(&rm, txn(2), "montreal", 2, 0);
    // Positive price overwrites
    seed(&rm, txn(3), "MONTREAL", 1, 45);

    let t = txn(4);
    assert_eq!(rm.query(t, "montreal").unwrap(), 8);
    assert_eq!(rm.query_price(t, "montreal").unwrap(), 45);
}

#[test]
fn test_unknown_item_queries_return_zero() {
    let rm = manager(ItemKind::Room);
    let t = txn(1);

    assert_eq!(rm.query(t, "nowhere").unwrap(), 0);
    assert_eq!(rm.query_price(t, "nowhere").unwrap(), 0);
    assert_eq!(rm.query_reserved(t, "nowhere").unwrap(), 0);
    assert!(!rm.reserve(t, "nowhere").unwrap());
    assert!(!rm.release(t, "nowhere", 1).unwrap());
    assert!(!rm.delete(t, "nowhere").unwrap());
}

#[test]
fn test_reserve_until_sold_out() {
    let rm = manager(ItemKind::Room);
    seed(&rm, txn(1), "toronto", 2, 80);

    let t = txn(2);
    assert!(rm.reserve(t, "toronto").unwrap());
    assert!(rm.reserve(t, "toronto").unwrap());
    assert!(!rm.reserve(t, "toronto").unwrap());
    assert_eq!(rm.query(t, "toronto").unwrap(), 0);
    assert_eq!(rm.query_reserved(t, "toronto").unwrap(), 2);
}

#[test]
fn test_release_saturates_reserved() {
    let rm = manager(ItemKind::Flight);
    seed(&rm, txn(1), "7", 3, 10);

    let t = txn(2);
    assert!(rm.reserve(t, "7").unwrap());
    assert!(rm.release(t, "7", 2).unwrap());
    assert_eq!(rm.query(t, "7").unwrap(), 4);
    assert_eq!(rm.query_reserved(t, "7").unwrap(), 0);
    assert_eq!(rm.query_price(t, "7").unwrap(), 10);
}

#[test]
fn test_deletion_guard() {
    let rm = manager(ItemKind::Flight);
    seed(&rm, txn(1), "100", 5, 10);

    let t = txn(2);
    assert!(rm.reserve(t, "100").unwrap());
    assert_eq!(rm.query(t, "100").unwrap(), 4);
    assert_eq!(rm.query_reserved(t, "100").unwrap(), 1);
    assert!(!rm.delete(t, "100").unwrap());
    rm.commit(t);

    // Sold out items can go even with reservations outstanding
    let t = txn(3);
    for _ in 0..4 {
        assert!(rm.reserve(t, "100").unwrap());
    }
    assert!(rm.delete(t, "100").unwrap());
    assert_eq!(rm.query(t, "100").unwrap(), 0);
}

// ============================================================================
// Commit and abort
// ============================================================================

#[test]
fn test_abort_rolls_back() {
    let rm = manager(ItemKind::Flight);
    seed(&rm, txn(1), "X", 10, 100);

    let t = txn(2);
    for _ in 0..3 {
        assert!(rm.reserve(t, "X").unwrap());
    }
    assert!(rm.abort(t));

    let fresh = txn(3);
    assert_eq!(rm.query(fresh, "X").unwrap(), 10);
    assert_eq!(rm.query_reserved(fresh, "X").unwrap(), 0);
}

#[test]
fn test_commit_is_durable() {
    let rm = manager(ItemKind::Flight);
    seed(&rm, txn(1), "X", 10, 100);

    let t = txn(2);
    for _ in 0..3 {
        assert!(rm.reserve(t, "X").unwrap());
    }
    assert!(rm.prepare(t));
    assert!(rm.commit(t));

    let fresh = txn(3);
    assert_eq!(rm.query(fresh, "X").unwrap(), 7);
    assert_eq!(rm.query_reserved(fresh, "X").unwrap(), 3);
}

#[test]
fn test_operations_after_commit_fail() {
    let rm = manager(ItemKind::Car);
    seed(&rm, txn(1), "paris", 1, 10);

    match rm.query(txn(1), "paris") {
        Err(Error::InvalidTransaction(t)) => assert_eq!(t, txn(1)),
        other => panic!("Expected InvalidTransaction, got {:?}", other),
    }
    assert!(!rm.abort(txn(1)));
}

// ============================================================================
// Wire dispatch
// ============================================================================

#[test]
fn test_execute_dispatch() {
    let rm = manager(ItemKind::Car);
    assert_eq!(rm.kind().service(), ServiceName::Cars);

    let t = txn(1);
    let add = ResourceOperation::Add {
        id: "lyon".to_string(),
        count: 2,
        price: 25,
    };
    assert_eq!(
        rm.execute(t, &add).unwrap(),
        ResourceResponse::Added {
            id: "lyon".to_string()
        }
    );

    match rm
        .execute(t, &ResourceOperation::Reserve { id: "lyon".to_string() })
        .unwrap()
    {
        ResourceResponse::Reserved { reserved, .. } => assert!(reserved),
        _ => panic!("Expected Reserved response"),
    }

    match rm
        .execute(t, &ResourceOperation::Query { id: "lyon".to_string() })
        .unwrap()
    {
        ResourceResponse::Count { count, .. } => assert_eq!(count, 1),
        _ => panic!("Expected Count response"),
    }
}

#[test]
fn test_operation_json_shape() {
    let op = ResourceOperation::Release {
        id: "100".to_string(),
        amount: 2,
    };
    let json = serde_json::to_value(&op).unwrap();
    assert_eq!(json["Release"]["amount"], 2);
}
