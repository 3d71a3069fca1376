//! Composite identifiers for JSON/SCA node trees.
//!
//! Every composite node carries an id that is unique within one encode pass.
//! Ids start at 1 and are carried on the wire as decimal strings.

use std::fmt;
use std::num::NonZeroU64;

use crate::error::DecodeError;

/// A positive integer identifying a composite within one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(NonZeroU64);

impl NodeId {
    /// The first id assigned by a fresh registry.
    pub const FIRST: NodeId = NodeId(NonZeroU64::MIN);

    /// Creates an id, returning `None` for zero.
    pub fn new(value: u64) -> Option<NodeId> {
        NonZeroU64::new(value).map(NodeId)
    }

    /// Returns the raw integer.
    pub fn get(self) -> u64 {
        self.0.get()
    }

    /// Returns the id following this one, or `None` on overflow.
    pub fn next(self) -> Option<NodeId> {
        self.0.checked_add(1).map(NodeId)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Formats an id as its wire string (`"1"`, `"2"`, ...).
pub fn format_id(id: NodeId) -> String {
    id.to_string()
}

/// Parses a wire id string.
///
/// Only plain ASCII decimal digits are accepted: no sign, no whitespace,
/// no zero.
pub fn parse_id(s: &str) -> Result<NodeId, DecodeError> {
    let invalid = || DecodeError::InvalidId { found: s.to_string() };
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    s.parse::<u64>().ok().and_then(NodeId::new).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse_roundtrip() {
        for raw in [1u64, 2, 10, 12345, u64::MAX] {
            let id = NodeId::new(raw).unwrap();
            assert_eq!(parse_id(&format_id(id)).unwrap(), id);
        }
    }

    #[test]
    fn test_parse_rejects_non_decimal() {
        for bad in ["", "0", "-1", "+1", " 1", "1.0", "abc", "18446744073709551616"] {
            assert!(
                matches!(parse_id(bad), Err(DecodeError::InvalidId { .. })),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_next_is_monotonic() {
        let first = NodeId::FIRST;
        assert_eq!(first.get(), 1);
        assert_eq!(first.next().unwrap().get(), 2);
        assert!(NodeId::new(u64::MAX).unwrap().next().is_none());
    }
}
