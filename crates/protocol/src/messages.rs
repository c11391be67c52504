//! Typed request and reply envelopes

use serde::{Deserialize, Serialize};
use travel_common::{Error, TransactionId};
use travel_crash::{CrashPoint, CrashSite};
use travel_customer::{CustomerId, CustomerOperation, CustomerResponse};
use travel_resource::{ItemKind, ResourceOperation, ResourceResponse};

/// Transaction phases in 2PC protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionPhase {
    /// Vote request
    Prepare,
    /// Decision
    Commit,
    /// Decision
    Abort,
}

impl TransactionPhase {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "prepare" => Some(Self::Prepare),
            "commit" => Some(Self::Commit),
            "abort" => Some(Self::Abort),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prepare => "prepare",
            Self::Commit => "commit",
            Self::Abort => "abort",
        }
    }
}

/// Middleware to participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceRequest {
    /// Inventory operation on a flights, cars or rooms service
    Resource {
        txn: TransactionId,
        operation: ResourceOperation,
    },
    /// Ledger operation on the customers service
    Customer {
        txn: TransactionId,
        operation: CustomerOperation,
    },
    /// Prepare, commit or abort
    Control {
        txn: TransactionId,
        phase: TransactionPhase,
    },
    /// Arm a crash point
    InjectCrash { point: CrashPoint },
    /// Die now
    Crash,
    /// Stop after a grace period
    Shutdown { grace_ms: u64 },
}

/// Participant to middleware
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceReply {
    Resource(ResourceResponse),
    Customer(CustomerResponse),
    /// Answer to a prepare
    Vote(bool),
    /// Outcome of a commit, abort or administrative request
    Done(bool),
    Error(Error),
}

impl ServiceReply {
    /// Wrap a service result
    pub fn from_result<T>(result: travel_common::Result<T>, wrap: impl FnOnce(T) -> Self) -> Self {
        match result {
            Ok(value) => wrap(value),
            Err(err) => ServiceReply::Error(err),
        }
    }
}

/// Client to middleware
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MiddlewareRequest {
    Start,
    Prepare {
        txn: TransactionId,
    },
    Commit {
        txn: TransactionId,
    },
    Abort {
        txn: TransactionId,
    },
    AddItem {
        txn: TransactionId,
        kind: ItemKind,
        id: String,
        count: u32,
        price: u32,
    },
    DeleteItem {
        txn: TransactionId,
        kind: ItemKind,
        id: String,
    },
    QueryItem {
        txn: TransactionId,
        kind: ItemKind,
        id: String,
    },
    QueryPrice {
        txn: TransactionId,
        kind: ItemKind,
        id: String,
    },
    NewCustomer {
        txn: TransactionId,
    },
    NewCustomerWithId {
        txn: TransactionId,
        customer: CustomerId,
    },
    DeleteCustomer {
        txn: TransactionId,
        customer: CustomerId,
    },
    QueryCustomerInfo {
        txn: TransactionId,
        customer: CustomerId,
    },
    Reserve {
        txn: TransactionId,
        customer: CustomerId,
        kind: ItemKind,
        id: String,
    },
    /// Flights, then optionally a car and a room at `location`
    Bundle {
        txn: TransactionId,
        customer: CustomerId,
        flights: Vec<String>,
        location: String,
        car: bool,
        room: bool,
    },
    InjectCrash {
        site: CrashSite,
        point: CrashPoint,
    },
    Crash {
        site: CrashSite,
    },
    Shutdown,
}

/// Middleware to client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MiddlewareReply {
    Started(TransactionId),
    Bool(bool),
    Count(u32),
    Customer(CustomerId),
    Text(String),
    Error(Error),
}

impl MiddlewareReply {
    pub fn from_result<T>(result: travel_common::Result<T>, wrap: impl FnOnce(T) -> Self) -> Self {
        match result {
            Ok(value) => wrap(value),
            Err(err) => MiddlewareReply::Error(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use travel_crash::{CrashPhase, CrashTiming};

    #[test]
    fn test_phase_strings() {
        for phase in [
            TransactionPhase::Prepare,
            TransactionPhase::Commit,
            TransactionPhase::Abort,
        ] {
            assert_eq!(TransactionPhase::parse(phase.as_str()), Some(phase));
        }
        assert_eq!(TransactionPhase::parse("vote"), None);
    }

    #[test]
    fn test_errors_cross_the_wire() {
        let reply = ServiceReply::Error(Error::Deadlock {
            txn: TransactionId::new(4),
            key: "cars".to_string(),
        });
        let json = serde_json::to_string(&reply).unwrap();
        assert_eq!(serde_json::from_str::<ServiceReply>(&json).unwrap(), reply);
    }

    #[test]
    fn test_crash_request_json() {
        let request = MiddlewareRequest::InjectCrash {
            site: CrashSite::Middleware,
            point: CrashPoint::new(CrashTiming::In, CrashPhase::Decision),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["InjectCrash"]["point"]["phase"], "Decision");
    }
}
