//! Participant service names

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A participant service owning one inventory category or the customer data
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ServiceName {
    /// Flight seat inventory
    Flights,
    /// Rental car inventory
    Cars,
    /// Hotel room inventory
    Rooms,
    /// Customer reservation ledgers
    Customers,
}

impl ServiceName {
    /// Every participant service, in enlistment order
    pub const ALL: [ServiceName; 4] = [
        ServiceName::Flights,
        ServiceName::Cars,
        ServiceName::Rooms,
        ServiceName::Customers,
    ];

    /// Lower-case name used on the wire and in lock namespaces
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceName::Flights => "flights",
            ServiceName::Cars => "cars",
            ServiceName::Rooms => "rooms",
            ServiceName::Customers => "customers",
        }
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flights" | "flight" => Ok(ServiceName::Flights),
            "cars" | "car" => Ok(ServiceName::Cars),
            "rooms" | "room" => Ok(ServiceName::Rooms),
            "customers" | "customer" => Ok(ServiceName::Customers),
            other => Err(format!("Unknown service: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Flights".parse(), Ok(ServiceName::Flights));
        assert_eq!("ROOMS".parse(), Ok(ServiceName::Rooms));
        assert_eq!("car".parse(), Ok(ServiceName::Cars));
        assert!("middleware".parse::<ServiceName>().is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for service in ServiceName::ALL {
            assert_eq!(service.to_string().parse(), Ok(service));
        }
    }
}
