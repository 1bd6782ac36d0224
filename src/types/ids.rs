use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error types for identifier parsing
#[derive(Error, Debug, PartialEq, Eq)]
pub enum IdError {
    #[error("Invalid identifier literal: {0}")]
    InvalidLiteral(String),

    #[error("Identifier sequence exhausted for {0}")]
    SequenceExhausted(&'static str),
}

macro_rules! small_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Wrap a raw identifier value
            pub const fn from_raw(value: u32) -> Self {
                Self(value)
            }

            /// Get the raw identifier value
            pub const fn as_raw(&self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> u32 {
                id.0
            }
        }
    };
}

small_id!(
    /// Identifier of a node type, unique among node types of one graph
    NodeTypeId,
    "nt"
);

small_id!(
    /// Identifier of an edge type, unique among edge types of one graph
    EdgeTypeId,
    "et"
);

small_id!(
    /// Identifier of a property type, unique across all owners of one graph
    PropertyTypeId,
    "pt"
);

/// ElementId: 64-bit identifier of a node or edge
///
/// Element ids are allocated from a single graph-wide sequence and double as
/// the slot index of the element in the element arena, so reopening a
/// persisted graph reproduces the exact same ids.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(u64);

impl ElementId {
    /// Create an ElementId from a raw 64-bit value
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw 64-bit value
    pub const fn as_raw(&self) -> u64 {
        self.0
    }

    /// Arena slot of this element
    pub(crate) fn slot(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<ElementId> for u64 {
    fn from(id: ElementId) -> u64 {
        id.0
    }
}

impl From<u64> for ElementId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// GraphId: opaque handle of a persisted graph
///
/// Returned by `Session::persist` and required by `Session::open`.
/// Zero is never allocated.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphId(u64);

impl GraphId {
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    pub const fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl From<GraphId> for u64 {
    fn from(id: GraphId) -> u64 {
        id.0
    }
}

impl std::str::FromStr for GraphId {
    type Err = IdError;

    /// Parses the hexadecimal form produced by `Display`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = u64::from_str_radix(s.trim(), 16)
            .map_err(|_| IdError::InvalidLiteral(s.to_string()))?;
        if value == 0 {
            return Err(IdError::InvalidLiteral(s.to_string()));
        }
        Ok(Self(value))
    }
}

/// Monotonic identifier sequence
///
/// Holds the next value to hand out. Sequences are persisted with the graph
/// and never move backwards, so identifiers are never reused.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sequence(u64);

impl Sequence {
    pub const fn starting_at(next: u64) -> Self {
        Self(next)
    }

    /// The value the next call to `advance` will return
    pub fn peek(&self) -> u64 {
        self.0
    }

    /// Hand out the next value, failing once `limit` is reached
    pub fn advance(&mut self, limit: u64, what: &'static str) -> Result<u64, IdError> {
        if self.0 >= limit {
            return Err(IdError::SequenceExhausted(what));
        }
        let value = self.0;
        self.0 += 1;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_id_display() {
        assert_eq!(NodeTypeId::from_raw(3).to_string(), "nt3");
        assert_eq!(EdgeTypeId::from_raw(0).to_string(), "et0");
        assert_eq!(PropertyTypeId::from_raw(12).to_string(), "pt12");
    }

    #[test]
    fn test_element_id_raw_conversion() {
        let original = ElementId::from_raw(12345);
        let raw: u64 = original.into();
        assert_eq!(ElementId::from(raw), original);
        assert_eq!(original.slot(), 12345);
        assert_eq!(format!("{}", original), "#12345");
    }

    #[test]
    fn test_graph_id_parse_display() {
        let id = GraphId::from_raw(0xabc);
        let text = id.to_string();
        assert_eq!(text, "0000000000000abc");
        assert_eq!(text.parse::<GraphId>().unwrap(), id);
    }

    #[test]
    fn test_graph_id_rejects_zero_and_garbage() {
        assert!("0".parse::<GraphId>().is_err());
        assert!("not-hex".parse::<GraphId>().is_err());
    }

    #[test]
    fn test_sequence_is_monotonic() {
        let mut seq = Sequence::default();
        assert_eq!(seq.advance(10, "test").unwrap(), 0);
        assert_eq!(seq.advance(10, "test").unwrap(), 1);
        assert_eq!(seq.peek(), 2);
    }

    #[test]
    fn test_sequence_exhausted() {
        let mut seq = Sequence::starting_at(2);
        assert_eq!(
            seq.advance(2, "node types"),
            Err(IdError::SequenceExhausted("node types"))
        );
        // A failed advance does not move the sequence
        assert_eq!(seq.peek(), 2);
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&ElementId::from_raw(7)).unwrap();
        assert_eq!(json, "7");
        let back: NodeTypeId = serde_json::from_str("4").unwrap();
        assert_eq!(back, NodeTypeId::from_raw(4));
    }
}
