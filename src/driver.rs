//! AB_ETH driver data model.
//!
//! This module defines the `EthDriver` struct, the central entity of the
//! crate: a named group of IPv4 node addresses plus the numeric
//! configuration values carried alongside it in the driver store.

use serde::{Deserialize, Serialize};

/// Maximum number of node addresses a single driver may hold.
pub const MAX_NODES_PER_DRIVER: usize = 254;

/// Maximum length of a driver display name.
pub const MAX_NAME_LEN: usize = 15;

/// Literal driver type token used in the interchange format and key names.
pub const DRIVER_TYPE: &str = "AB_ETH";

/// One AB_ETH driver instance.
///
/// `name` is the identity key: drivers are matched across sets by exact,
/// case-sensitive name equality. `key_name` identifies the store slot
/// ("AB_ETH-1", "AB_ETH-2", ...) and stays empty until a slot is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthDriver {
    /// Store slot identifier, e.g. "AB_ETH-3". Empty when not yet assigned.
    pub key_name: String,
    /// Display name, non-empty and at most 15 characters.
    pub name: String,
    /// Station number.
    pub station: u32,
    /// Ping timeout in seconds.
    pub ping_timeout: u32,
    /// Inactivity timeout in seconds.
    pub inactivity_timeout: u32,
    /// Startup flag (0 or 1).
    pub startup: u32,
    /// Node addresses, ordered, without duplicates.
    pub nodes: Vec<String>,
}

impl EthDriver {
    /// Create a fresh driver with default configuration values and no
    /// store slot assigned.
    pub fn new(name: impl Into<String>) -> Self {
        EthDriver {
            key_name: String::new(),
            name: name.into(),
            station: 63,
            ping_timeout: 6,
            inactivity_timeout: 30,
            startup: 0,
            nodes: Vec::new(),
        }
    }

    /// Whether this driver has been assigned a store slot.
    pub fn has_key(&self) -> bool {
        !self.key_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_driver_defaults() {
        let driver = EthDriver::new("FL-IRVING");
        assert_eq!(driver.name, "FL-IRVING");
        assert_eq!(driver.key_name, "");
        assert!(!driver.has_key());
        assert_eq!(driver.station, 63);
        assert_eq!(driver.ping_timeout, 6);
        assert_eq!(driver.inactivity_timeout, 30);
        assert_eq!(driver.startup, 0);
        assert!(driver.nodes.is_empty());
    }

    #[test]
    fn test_driver_json_round_trip() {
        let mut driver = EthDriver::new("PLANT-2");
        driver.key_name = "AB_ETH-7".to_string();
        driver.nodes = vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()];

        let json = serde_json::to_string(&driver).unwrap();
        let back: EthDriver = serde_json::from_str(&json).unwrap();
        assert_eq!(back, driver);
    }
}
