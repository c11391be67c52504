//! Transaction identifier
//!
//! Identifiers are allocated by the single coordinator from a monotonic
//! counter starting at 1, so their numeric order is also their start order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transaction identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(u64);

impl TransactionId {
    /// The first identifier handed out by a coordinator
    pub const FIRST: TransactionId = TransactionId(1);

    /// Create from a raw value
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// The identifier following this one
    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Result<Self, String> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|e| format!("Invalid transaction ID: {}", e))
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransactionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<u64> for TransactionId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        let id1 = TransactionId::FIRST;
        let id2 = id1.next();

        assert!(id1 < id2);
        assert_eq!(id2.as_u64(), 2);
    }

    #[test]
    fn test_parse() {
        assert_eq!(TransactionId::parse(" 42 "), Ok(TransactionId::new(42)));
        assert!(TransactionId::parse("abc").is_err());
        assert!("-1".parse::<TransactionId>().is_err());
    }

    #[test]
    fn test_hash_eq_consistency() {
        use std::collections::HashMap;

        let id1 = TransactionId::new(7);
        let id2 = id1; // Copy

        let mut map = HashMap::new();
        map.insert(id1, "value");

        assert_eq!(map.get(&id2), Some(&"value"));
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&TransactionId::new(9)).unwrap();
        assert_eq!(json, "9");
    }
}
