//! # LinxPort - Import/export utility for AB_ETH driver address lists
//!
//! This library provides the core functionality for exchanging AB_ETH
//! Ethernet driver configurations between a persistent driver store and a
//! compact CSV interchange format.
//!
//! ## Overview
//!
//! An AB_ETH driver is a named group of IPv4 node addresses plus a handful
//! of numeric configuration values. LinxPort reads driver definitions from
//! CSV files, reconciles them against the drivers already in the store, and
//! writes the store back out as CSV. Mostly-contiguous address sets are
//! represented compactly as "base.start-end" ranges in both directions.
//!
//! ## Key Features
//!
//! - **Range notation**: contiguous last-octet runs collapse to
//!   "192.168.2.10-90" style ranges and expand back losslessly
//! - **Strict validation**: CSV parsing is all-or-nothing, with 1-based
//!   line numbers in every error
//! - **Duplicate and capacity guards**: no repeated node per driver, at
//!   most 254 nodes per driver
//! - **Two import policies**: merge (union node lists) or overwrite
//!   (replace node lists wholesale), both deterministic and side-effect
//!   free
//! - **Pluggable persistence**: driver storage sits behind the
//!   `DriverStore` trait
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - `driver`: the `EthDriver` data model and its limits
//! - `range`: IPv4 range codec (expand/compact/validate)
//! - `csv`: CSV interchange format (validate/parse/write)
//! - `import`: reconciliation of current vs. imported driver sets
//! - `store`: the `DriverStore` trait with in-memory and JSON-file backends
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use linxport::csv;
//! use linxport::import;
//! use linxport::store::{DriverStore, JsonFileStore};
//!
//! let mut store = JsonFileStore::new("drivers.json");
//! let current = store.load_all()?;
//! let imported = csv::read_drivers_from_file("import.csv")?;
//!
//! let result = import::merge_drivers(&current, &imported);
//! for driver in result.updated_drivers.iter().chain(&result.new_drivers) {
//!     store.save(driver)?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! Library errors are typed per module (`RangeError`, `CsvError`,
//! `StoreError`) via `thiserror`; the binary wraps them in
//! `color_eyre::Result` for reporting. Reconciliation collects
//! human-readable errors in its `ImportResult` instead of failing fast,
//! so a partially capped merge still yields a usable result.

pub mod driver;
pub mod range;
pub mod csv;
pub mod import;
pub mod store;

pub use driver::{EthDriver, DRIVER_TYPE, MAX_NAME_LEN, MAX_NODES_PER_DRIVER};
pub use import::ImportResult;
