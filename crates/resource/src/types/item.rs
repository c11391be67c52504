//! Reservable items and their keys

use serde::{Deserialize, Serialize};
use std::fmt;
use travel_common::ServiceName;

/// Kind of item a resource manager serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Flight,
    Car,
    Room,
}

impl ItemKind {
    pub const ALL: [ItemKind; 3] = [ItemKind::Flight, ItemKind::Car, ItemKind::Room];

    /// The service owning items of this kind
    pub fn service(&self) -> ServiceName {
        match self {
            ItemKind::Flight => ServiceName::Flights,
            ItemKind::Car => ServiceName::Cars,
            ItemKind::Room => ServiceName::Rooms,
        }
    }

    /// Kind served by a service, if it serves items at all
    pub fn from_service(service: ServiceName) -> Option<Self> {
        match service {
            ServiceName::Flights => Some(ItemKind::Flight),
            ServiceName::Cars => Some(ItemKind::Car),
            ServiceName::Rooms => Some(ItemKind::Room),
            ServiceName::Customers => None,
        }
    }

    /// Storage key of an item: `flight-<number>`, `car-<location>`, `room-<location>`
    pub fn item_key(&self, id: &str) -> String {
        let prefix = match self {
            ItemKind::Flight => "flight",
            ItemKind::Car => "car",
            ItemKind::Room => "room",
        };
        format!("{}-{}", prefix, id.trim().to_lowercase())
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Flight => f.write_str("flight"),
            ItemKind::Car => f.write_str("car"),
            ItemKind::Room => f.write_str("room"),
        }
    }
}

/// Inventory of one flight, car location or hotel location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservableItem {
    pub key: String,
    /// Units still available
    pub count: u32,
    pub price: u32,
    /// Units handed out to customers
    pub reserved: u32,
}

impl ReservableItem {
    pub fn new(key: impl Into<String>, count: u32, price: u32) -> Self {
        Self {
            key: key.into(),
            count,
            price,
            reserved: 0,
        }
    }
}
