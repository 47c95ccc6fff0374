//! IPv4 range codec.
//!
//! Converts between flat lists of IPv4 address strings and the compact
//! "base.start-end" notation used by the interchange format. A range covers
//! a contiguous run of last-octet values under a shared three-octet prefix;
//! addresses in different subnets always produce separate ranges.

use std::collections::BTreeMap;

/// Errors produced while expanding a "base.start-end" range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("range \"{0}\" is empty")]
    Empty(String),

    #[error("range \"{0}\" has no '.' separating base and octet range")]
    MissingDot(String),

    #[error("range \"{0}\" has no '-' (not a range)")]
    NotARange(String),

    #[error("range \"{0}\" is missing a start or end value")]
    MissingEndpoint(String),

    #[error("range \"{0}\" has a non-numeric start or end value")]
    NotNumeric(String),

    #[error("range \"{0}\" has an octet outside 0-255")]
    OctetOutOfBounds(String),

    #[error("range \"{0}\" ends before it starts")]
    Inverted(String),
}

/// Check whether a string is a valid dotted-quad IPv4 address.
///
/// Exactly four non-empty dot-separated segments, each an integer in 0-255.
/// Surrounding whitespace is ignored. This is deliberately hand-rolled
/// rather than `Ipv4Addr::from_str`: the interchange format tolerates
/// leading zeros ("010.0.0.1"), which the std parser rejects.
pub fn is_valid_ipv4(ip: &str) -> bool {
    let s = ip.trim();
    if s.is_empty() {
        return false;
    }

    let parts: Vec<&str> = s.split('.').collect();
    if parts.len() != 4 {
        return false;
    }

    parts.iter().all(|part| {
        !part.is_empty() && matches!(part.parse::<i64>(), Ok(n) if (0..=255).contains(&n))
    })
}

/// Split an IPv4 string into its subnet base (first three octets plus the
/// trailing dot, e.g. "192.168.1.") and its last octet value.
///
/// Returns `None` when the string does not have that shape.
fn split_last_octet(ip: &str) -> Option<(&str, u8)> {
    let s = ip.trim();
    if s.is_empty() {
        return None;
    }

    let dot = s.rfind('.')?;
    let base = &s[..dot + 1];
    let tail = s[dot + 1..].trim();
    if tail.is_empty() {
        return None;
    }

    // i64 so "+5"/oversized values are rejected by the bounds check, not a wrap
    let host: i64 = tail.parse().ok()?;
    if !(0..=255).contains(&host) {
        return None;
    }

    Some((base, host as u8))
}

/// Expand "a.b.c.start-end" into the individual addresses it covers,
/// in ascending order.
///
/// Only the dashed range form is handled here; a bare address is an error
/// (single addresses are passed through unexpanded by the CSV layer).
pub fn expand_range(range: &str) -> Result<Vec<String>, RangeError> {
    let s = range.trim();
    if s.is_empty() {
        return Err(RangeError::Empty(range.to_string()));
    }

    // Last '.' separates the base from the octet range
    let dot = s.rfind('.').ok_or_else(|| RangeError::MissingDot(s.to_string()))?;
    let base = &s[..dot + 1];
    let tail = s[dot + 1..].trim();
    if tail.is_empty() {
        return Err(RangeError::MissingEndpoint(s.to_string()));
    }

    let dash = tail.find('-').ok_or_else(|| RangeError::NotARange(s.to_string()))?;
    let start_str = tail[..dash].trim();
    let end_str = tail[dash + 1..].trim();

    // Covers "192.168.1.-5" and "192.168.1.10-"
    if start_str.is_empty() || end_str.is_empty() {
        return Err(RangeError::MissingEndpoint(s.to_string()));
    }

    if !start_str.chars().all(|c| c.is_ascii_digit())
        || !end_str.chars().all(|c| c.is_ascii_digit())
    {
        return Err(RangeError::NotNumeric(s.to_string()));
    }

    let start: u32 = start_str
        .parse()
        .map_err(|_| RangeError::NotNumeric(s.to_string()))?;
    let end: u32 = end_str
        .parse()
        .map_err(|_| RangeError::NotNumeric(s.to_string()))?;

    if start > 255 || end > 255 {
        return Err(RangeError::OctetOutOfBounds(s.to_string()));
    }
    if end < start {
        return Err(RangeError::Inverted(s.to_string()));
    }

    Ok((start..=end).map(|host| format!("{}{}", base, host)).collect())
}

/// Compact a node list into range notation.
///
/// Nodes are grouped by subnet base; within each base, last octets are
/// sorted and deduplicated, then contiguous runs become "base.start-end"
/// entries and isolated values become plain addresses. Bases are emitted in
/// ascending lexicographic order. Entries that do not parse as IPv4 with a
/// trailing octet are passed through untouched, each as its own entry.
pub fn nodes_to_ranges(nodes: &[String]) -> Vec<String> {
    let mut results = Vec::new();
    if nodes.is_empty() {
        return results;
    }

    // BTreeMap keeps subnet bases in ascending order, which callers rely on
    let mut groups: BTreeMap<&str, Vec<u8>> = BTreeMap::new();

    for node in nodes {
        match split_last_octet(node) {
            Some((base, host)) => groups.entry(base).or_default().push(host),
            None => {
                let trimmed = node.trim();
                if !trimmed.is_empty() {
                    results.push(trimmed.to_string());
                }
            }
        }
    }

    for (base, mut hosts) in groups {
        hosts.sort_unstable();
        hosts.dedup();

        let mut i = 0;
        while i < hosts.len() {
            let start = hosts[i];
            let mut end = start;

            while i + 1 < hosts.len() && hosts[i + 1] == end + 1 {
                i += 1;
                end = hosts[i];
            }

            if start == end {
                results.push(format!("{}{}", base, start));
            } else {
                results.push(format!("{}{}-{}", base, start, end));
            }

            i += 1;
        }
    }

    results
}
