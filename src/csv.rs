//! CSV interchange format for driver address lists.
//!
//! The format is three comma-separated columns with a fixed header:
//!
//! ```text
//! Type,Name,Range
//! AB_ETH,FL-IRVING,192.168.2.10-90
//! AB_ETH,FL-IRVING,192.168.3.5
//! ```
//!
//! `Type` must be the literal `AB_ETH`, `Name` is the driver display name
//! (at most 15 characters), and `Range` is either a single IPv4 address or
//! a "base.start-end" range. Splitting on commas is literal; there is no
//! quoting or escaping. Blank lines between data lines are allowed.
//!
//! Validation and parsing are all-or-nothing: the first offending line
//! aborts the whole pass with a 1-based line number (the header is line 1).

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::driver::{EthDriver, DRIVER_TYPE, MAX_NAME_LEN, MAX_NODES_PER_DRIVER};
use crate::range::{self, RangeError};

/// Errors produced while validating, parsing or writing the CSV format.
#[derive(Debug, thiserror::Error)]
pub enum CsvError {
    #[error("CSV file is empty")]
    EmptyFile,

    #[error("CSV header is invalid, expected: Type,Name,Range")]
    InvalidHeader,

    #[error("line {line}: expected 3 columns (Type,Name,Range)")]
    ColumnCount { line: usize },

    #[error("line {line}: unsupported Type \"{found}\", expected \"AB_ETH\"")]
    UnsupportedType { line: usize, found: String },

    #[error("line {line}: Name field is empty")]
    EmptyName { line: usize },

    #[error("line {line}: driver name \"{name}\" exceeds 15-character limit")]
    NameTooLong { line: usize, name: String },

    #[error("line {line}: Range field is empty")]
    EmptyRange { line: usize },

    #[error("line {line}: {source}")]
    BadRange { line: usize, source: RangeError },

    #[error("line {line}: \"{addr}\" is not a valid IPv4 address")]
    InvalidAddress { line: usize, addr: String },

    #[error("line {line}: duplicate node IP \"{addr}\" for driver \"{driver}\"")]
    DuplicateNode {
        line: usize,
        addr: String,
        driver: String,
    },

    #[error("driver \"{driver}\" exceeds maximum of 254 nodes, limit reached at line {line}")]
    NodeLimit { driver: String, line: usize },

    #[error("failed to access CSV file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Split one CSV line into trimmed columns. Commas are literal separators.
fn split_line(line: &str) -> Vec<&str> {
    line.split(',').map(str::trim).collect()
}

/// One parsed data row: (line number, name, expanded addresses).
type DataRow = (usize, String, Vec<String>);

/// Walk the data lines of an already-header-checked document, validating
/// each row and expanding its range. Shared by `validate_lines` and
/// `parse_drivers` so both report identical errors.
fn read_rows<'a, I>(lines: I) -> Result<Vec<DataRow>, CsvError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut rows = Vec::new();

    // Data starts at line 2; the header is line 1
    for (idx, raw) in lines.into_iter().enumerate() {
        let line_num = idx + 2;

        if raw.trim().is_empty() {
            continue;
        }

        let cols = split_line(raw);
        if cols.len() < 3 {
            return Err(CsvError::ColumnCount { line: line_num });
        }

        let (type_col, name, range_col) = (cols[0], cols[1], cols[2]);

        if type_col != DRIVER_TYPE {
            return Err(CsvError::UnsupportedType {
                line: line_num,
                found: type_col.to_string(),
            });
        }

        if name.is_empty() {
            return Err(CsvError::EmptyName { line: line_num });
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(CsvError::NameTooLong {
                line: line_num,
                name: name.to_string(),
            });
        }

        if range_col.is_empty() {
            return Err(CsvError::EmptyRange { line: line_num });
        }

        let addrs = if range_col.contains('-') {
            let ips = range::expand_range(range_col)
                .map_err(|source| CsvError::BadRange { line: line_num, source })?;
            for ip in &ips {
                if !range::is_valid_ipv4(ip) {
                    return Err(CsvError::InvalidAddress {
                        line: line_num,
                        addr: ip.clone(),
                    });
                }
            }
            ips
        } else {
            if !range::is_valid_ipv4(range_col) {
                return Err(CsvError::InvalidAddress {
                    line: line_num,
                    addr: range_col.to_string(),
                });
            }
            vec![range_col.to_string()]
        };

        rows.push((line_num, name.to_string(), addrs));
    }

    Ok(rows)
}

/// Check the header line, returning the remaining data lines on success.
fn check_header<'a>(lines: &'a [&'a str]) -> Result<&'a [&'a str], CsvError> {
    let header = lines.first().ok_or(CsvError::EmptyFile)?;

    let cols = split_line(header);
    if cols.len() < 3 || cols[0] != "Type" || cols[1] != "Name" || cols[2] != "Range" {
        return Err(CsvError::InvalidHeader);
    }

    Ok(&lines[1..])
}

/// Validate the structure of an interchange document without building
/// drivers. Stops at the first offending line.
pub fn validate_lines(lines: &[&str]) -> Result<(), CsvError> {
    let data = check_header(lines)?;
    read_rows(data.iter().copied()).map(|_| ())
}

/// Parse an interchange document into a driver list.
///
/// Rows sharing a name accumulate into one driver; the first row for a name
/// creates the driver with default configuration values and no store slot.
/// A duplicate address for a driver, or a driver growing past the node
/// limit, aborts the whole parse.
pub fn parse_drivers(lines: &[&str]) -> Result<Vec<EthDriver>, CsvError> {
    let data = check_header(lines)?;
    let rows = read_rows(data.iter().copied())?;

    let mut drivers: Vec<EthDriver> = Vec::new();
    let mut index_by_name: HashMap<String, usize> = HashMap::new();
    let mut seen_nodes: HashMap<String, HashSet<String>> = HashMap::new();

    for (line_num, name, addrs) in rows {
        let idx = match index_by_name.get(&name) {
            Some(&idx) => idx,
            None => {
                drivers.push(EthDriver::new(name.clone()));
                index_by_name.insert(name.clone(), drivers.len() - 1);
                drivers.len() - 1
            }
        };
        let driver = &mut drivers[idx];
        let seen = seen_nodes.entry(name.clone()).or_default();

        for addr in addrs {
            let ip = addr.trim().to_string();

            if seen.contains(&ip) {
                return Err(CsvError::DuplicateNode {
                    line: line_num,
                    addr: ip,
                    driver: name,
                });
            }

            if driver.nodes.len() >= MAX_NODES_PER_DRIVER {
                return Err(CsvError::NodeLimit {
                    driver: name,
                    line: line_num,
                });
            }

            driver.nodes.push(ip.clone());
            seen.insert(ip);
        }
    }

    Ok(drivers)
}

/// Serialize drivers into interchange lines, header included.
///
/// Drivers appear in input order; each driver's node list is compacted into
/// ranges, one line per range. A driver with no nodes still gets one line,
/// with an empty Range field.
pub fn write_drivers(drivers: &[EthDriver]) -> Vec<String> {
    let mut lines = vec!["Type,Name,Range".to_string()];

    for driver in drivers {
        let ranges = range::nodes_to_ranges(&driver.nodes);

        if ranges.is_empty() {
            lines.push(format!("{},{},", DRIVER_TYPE, driver.name));
            continue;
        }

        for r in ranges {
            lines.push(format!("{},{},{}", DRIVER_TYPE, driver.name, r));
        }
    }

    lines
}

/// Read and parse an interchange file from disk.
pub fn read_drivers_from_file(path: impl AsRef<Path>) -> Result<Vec<EthDriver>, CsvError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| CsvError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let lines: Vec<&str> = text.lines().collect();
    let drivers = parse_drivers(&lines)?;
    log::debug!("Parsed {} driver(s) from '{}'", drivers.len(), path.display());
    Ok(drivers)
}

/// Serialize drivers and write them to an interchange file on disk.
pub fn write_drivers_to_file(
    path: impl AsRef<Path>,
    drivers: &[EthDriver],
) -> Result<(), CsvError> {
    let path = path.as_ref();
    let mut text = write_drivers(drivers).join("\n");
    text.push('\n');

    fs::write(path, text).map_err(|source| CsvError::Io {
        path: path.display().to_string(),
        source,
    })?;
    log::debug!("Wrote {} driver(s) to '{}'", drivers.len(), path.display());
    Ok(())
}
