//! Driver set reconciliation.
//!
//! Combines the authoritative driver set from the store with a freshly
//! parsed import under one of two policies:
//!
//! - **merge**: imported nodes are unioned into the matching driver's
//!   node list; nothing already present is lost.
//! - **overwrite**: the matching driver's node list is replaced wholesale
//!   by the imported one.
//!
//! Drivers are matched by exact name. Imported drivers with no match
//! become new store entries and receive the next free "AB_ETH-x" key.
//! Store drivers absent from the import are left untouched by both
//! policies; reconciliation never deletes.
//!
//! Both entry points are pure: they read their inputs, produce a fresh
//! `ImportResult`, and leave the inputs unmodified.

use std::collections::{BTreeSet, HashMap};

use crate::driver::{EthDriver, MAX_NODES_PER_DRIVER};

/// Outcome of a reconciliation pass.
///
/// `updated_drivers` are existing store entries with modified node lists;
/// `new_drivers` are imported drivers with freshly assigned keys. `errors`
/// collects human-readable problems; only precondition failures clear
/// `success` (a capped merge is reported but does not fail the pass).
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    /// Drivers that were modified (existing store entries).
    pub updated_drivers: Vec<EthDriver>,
    /// Drivers that were added (new AB_ETH-x entries).
    pub new_drivers: Vec<EthDriver>,
    /// Any errors that occurred during the import.
    pub errors: Vec<String>,
    /// Whether the reconciliation produced a usable result.
    pub success: bool,
}

impl ImportResult {
    fn new() -> Self {
        ImportResult {
            success: true,
            ..Default::default()
        }
    }
}

/// Extract the numeric suffix from an "AB_ETH-x" key name.
fn key_index(key_name: &str) -> Option<u32> {
    key_name.strip_prefix("AB_ETH-")?.parse().ok()
}

/// Highest numeric suffix among the store drivers' key names.
/// Drivers with malformed or foreign keys contribute nothing.
fn max_key_index(drivers: &[EthDriver]) -> u32 {
    drivers
        .iter()
        .filter_map(|d| key_index(&d.key_name))
        .max()
        .unwrap_or(0)
}

/// Clone an imported driver as a new store entry, minting the next free
/// key if its current key does not follow the AB_ETH-x pattern.
fn adopt_new_driver(imported: &EthDriver, max_index: &mut u32) -> EthDriver {
    let mut new_driver = imported.clone();
    if key_index(&new_driver.key_name).is_none() {
        *max_index += 1;
        new_driver.key_name = format!("AB_ETH-{}", max_index);
        log::debug!(
            "Assigned key {} to new driver '{}'",
            new_driver.key_name,
            new_driver.name
        );
    }
    new_driver
}

/// Guard shared by both policies: an empty import against a populated
/// store is a refused operation, not a mass no-op.
fn check_import_not_empty(
    current: &[EthDriver],
    imported: &[EthDriver],
    result: &mut ImportResult,
) -> bool {
    if imported.is_empty() && !current.is_empty() {
        result.errors.push("No drivers found in import.".to_string());
        result.success = false;
        return false;
    }
    true
}

/// Merge imported drivers into the current set.
///
/// Matched drivers get the set union of their node lists, capped at the
/// node limit; imported nodes past the cap are skipped with a recorded,
/// non-fatal error. Unmatched imported drivers are adopted as new entries.
pub fn merge_drivers(current: &[EthDriver], imported: &[EthDriver]) -> ImportResult {
    let mut result = ImportResult::new();
    let mut max_index = max_key_index(current);

    if !check_import_not_empty(current, imported, &mut result) {
        return result;
    }

    let current_by_name: HashMap<&str, &EthDriver> =
        current.iter().map(|d| (d.name.as_str(), d)).collect();

    for import in imported {
        match current_by_name.get(import.name.as_str()) {
            Some(&existing) => {
                let mut node_set: BTreeSet<String> = existing.nodes.iter().cloned().collect();

                for node in &import.nodes {
                    if node_set.len() >= MAX_NODES_PER_DRIVER && !node_set.contains(node) {
                        result.errors.push(format!(
                            "Driver '{}' ({}) has reached maximum node limit. Extra nodes were skipped.",
                            existing.name, existing.key_name
                        ));
                        log::warn!(
                            "Merge capped driver '{}' at {} nodes",
                            existing.name,
                            MAX_NODES_PER_DRIVER
                        );
                        break;
                    }
                    node_set.insert(node.clone());
                }

                let mut updated = existing.clone();
                updated.nodes = node_set.into_iter().collect();
                result.updated_drivers.push(updated);
            }
            None => {
                result.new_drivers.push(adopt_new_driver(import, &mut max_index));
            }
        }
    }

    result
}

/// Overwrite current drivers with the imported set.
///
/// Matched drivers have their node lists replaced verbatim by the imported
/// ones. Unmatched imported drivers are adopted exactly as in merge.
pub fn overwrite_drivers(current: &[EthDriver], imported: &[EthDriver]) -> ImportResult {
    let mut result = ImportResult::new();
    let mut max_index = max_key_index(current);

    if !check_import_not_empty(current, imported, &mut result) {
        return result;
    }

    let current_by_name: HashMap<&str, &EthDriver> =
        current.iter().map(|d| (d.name.as_str(), d)).collect();

    for import in imported {
        match current_by_name.get(import.name.as_str()) {
            Some(&existing) => {
                let mut updated = existing.clone();
                updated.nodes = import.nodes.clone();
                result.updated_drivers.push(updated);
            }
            None => {
                result.new_drivers.push(adopt_new_driver(import, &mut max_index));
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver(key: &str, name: &str, nodes: &[&str]) -> EthDriver {
        let mut d = EthDriver::new(name);
        d.key_name = key.to_string();
        d.nodes = nodes.iter().map(|s| s.to_string()).collect();
        d
    }

    #[test]
    fn test_key_index_parsing() {
        assert_eq!(key_index("AB_ETH-4"), Some(4));
        assert_eq!(key_index("AB_ETH-"), None);
        assert_eq!(key_index("AB_ETH-x"), None);
        assert_eq!(key_index("FOO-9"), None);
        assert_eq!(key_index(""), None);
    }

    #[test]
    fn test_merge_unions_nodes() {
        let current = vec![driver("AB_ETH-1", "A", &["10.0.0.1", "10.0.0.2"])];
        let imported = vec![driver("", "A", &["10.0.0.2", "10.0.0.3"])];

        let result = merge_drivers(&current, &imported);
        assert!(result.success);
        assert!(result.errors.is_empty());
        assert!(result.new_drivers.is_empty());
        assert_eq!(result.updated_drivers.len(), 1);

        let nodes: BTreeSet<&str> = result.updated_drivers[0]
            .nodes
            .iter()
            .map(String::as_str)
            .collect();
        let expected: BTreeSet<&str> = ["10.0.0.1", "10.0.0.2", "10.0.0.3"].into_iter().collect();
        assert_eq!(nodes, expected);
        // Untouched fields carry through from the store copy
        assert_eq!(result.updated_drivers[0].key_name, "AB_ETH-1");
    }

    #[test]
    fn test_merge_does_not_mutate_inputs() {
        let current = vec![driver("AB_ETH-1", "A", &["10.0.0.1"])];
        let imported = vec![driver("", "A", &["10.0.0.2"])];

        let _ = merge_drivers(&current, &imported);
        assert_eq!(current[0].nodes, vec!["10.0.0.1"]);
        assert_eq!(imported[0].nodes, vec!["10.0.0.2"]);
    }

    #[test]
    fn test_merge_caps_at_node_limit() {
        let mut current_driver = driver("AB_ETH-1", "BIG", &[]);
        current_driver.nodes = (0..254).map(|i| format!("10.0.{}.{}", i / 250, i % 250)).collect();
        let imported = vec![driver("", "BIG", &["192.168.0.1", "192.168.0.2"])];

        let result = merge_drivers(&[current_driver], &imported);
        assert!(result.success, "capacity cap is a warning, not a failure");
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("maximum node limit"));
        assert_eq!(result.updated_drivers[0].nodes.len(), 254);
    }

    #[test]
    fn test_merge_at_limit_with_only_duplicates_is_clean() {
        let mut full = driver("AB_ETH-1", "BIG", &[]);
        full.nodes = (0..254).map(|i| format!("10.0.{}.{}", i / 250, i % 250)).collect();
        let imported = vec![driver("", "BIG", &[full.nodes[0].as_str()])];

        let result = merge_drivers(std::slice::from_ref(&full), &imported);
        assert!(result.success);
        assert!(result.errors.is_empty());
        assert_eq!(result.updated_drivers[0].nodes.len(), 254);
    }

    #[test]
    fn test_overwrite_replaces_nodes() {
        let current = vec![driver("AB_ETH-1", "A", &["10.0.0.1", "10.0.0.2"])];
        let imported = vec![driver("", "A", &["10.0.0.3"])];

        let result = overwrite_drivers(&current, &imported);
        assert!(result.success);
        assert_eq!(result.updated_drivers.len(), 1);
        assert_eq!(result.updated_drivers[0].nodes, vec!["10.0.0.3"]);
        assert_eq!(result.updated_drivers[0].key_name, "AB_ETH-1");
        assert!(result.new_drivers.is_empty());
    }

    #[test]
    fn test_new_driver_gets_next_key() {
        let current = vec![
            driver("AB_ETH-1", "A", &[]),
            driver("AB_ETH-4", "B", &[]),
            driver("legacy", "C", &[]),
        ];
        let imported = vec![driver("", "D", &["10.0.0.1"])];

        let result = merge_drivers(&current, &imported);
        assert_eq!(result.new_drivers.len(), 1);
        assert_eq!(result.new_drivers[0].key_name, "AB_ETH-5");
    }

    #[test]
    fn test_multiple_new_drivers_keyed_in_input_order() {
        let current = vec![driver("AB_ETH-2", "A", &[])];
        let imported = vec![
            driver("", "FIRST", &[]),
            driver("", "SECOND", &[]),
            driver("AB_ETH-9", "KEYED", &[]),
        ];

        let result = overwrite_drivers(&current, &imported);
        assert_eq!(result.new_drivers.len(), 3);
        assert_eq!(result.new_drivers[0].key_name, "AB_ETH-3");
        assert_eq!(result.new_drivers[1].key_name, "AB_ETH-4");
        // A conforming key on the import is kept as-is
        assert_eq!(result.new_drivers[2].key_name, "AB_ETH-9");
    }

    #[test]
    fn test_empty_import_against_populated_store_fails() {
        let current = vec![driver("AB_ETH-1", "A", &[])];

        for result in [merge_drivers(&current, &[]), overwrite_drivers(&current, &[])] {
            assert!(!result.success);
            assert_eq!(result.errors.len(), 1);
            assert!(result.updated_drivers.is_empty());
            assert!(result.new_drivers.is_empty());
        }
    }

    #[test]
    fn test_both_empty_is_trivially_successful() {
        let result = merge_drivers(&[], &[]);
        assert!(result.success);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_drivers_absent_from_import_are_untouched() {
        let current = vec![
            driver("AB_ETH-1", "KEEP", &["10.0.0.1"]),
            driver("AB_ETH-2", "TOUCH", &["10.0.0.2"]),
        ];
        let imported = vec![driver("", "TOUCH", &["10.0.0.9"])];

        let result = overwrite_drivers(&current, &imported);
        assert_eq!(result.updated_drivers.len(), 1);
        assert_eq!(result.updated_drivers[0].name, "TOUCH");
        assert!(result.new_drivers.iter().all(|d| d.name != "KEEP"));
    }

    #[test]
    fn test_reconciliation_is_deterministic() {
        let current = vec![driver("AB_ETH-1", "A", &["10.0.0.2", "10.0.0.1"])];
        let imported = vec![driver("", "A", &["10.0.0.3"]), driver("", "B", &[])];

        let first = merge_drivers(&current, &imported);
        let second = merge_drivers(&current, &imported);
        assert_eq!(first.updated_drivers, second.updated_drivers);
        assert_eq!(first.new_drivers, second.new_drivers);
    }
}
