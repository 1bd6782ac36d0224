use crate::types::{EdgeTypeId, ElementType, NodeTypeId, PropertyTypeId, ValueKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index kind of a property type
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum IndexKind {
    /// At most one element per value; point lookup by value
    Unique,
    /// Many elements per value; point and range lookup
    Indexed,
    /// Stored only; lookup requires a full scan
    Basic,
}

impl IndexKind {
    pub fn is_indexed(&self) -> bool {
        !matches!(self, IndexKind::Basic)
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndexKind::Unique => "unique",
            IndexKind::Indexed => "indexed",
            IndexKind::Basic => "basic",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeType {
    pub id: NodeTypeId,
    pub name: String,
}

/// Endpoint restriction of an edge type
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRestriction {
    pub source: NodeTypeId,
    pub target: NodeTypeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeType {
    pub id: EdgeTypeId,
    pub name: String,
    pub directed: bool,
    pub restriction: Option<EdgeRestriction>,
}

impl EdgeType {
    /// Whether an edge `source -> target` with the given endpoint node types
    /// satisfies this type's restriction
    ///
    /// Directed types require the exact order; undirected types accept the
    /// restricted pair in either order.
    pub fn admits(&self, source: NodeTypeId, target: NodeTypeId) -> bool {
        match self.restriction {
            None => true,
            Some(r) if self.directed => r.source == source && r.target == target,
            Some(r) => {
                (r.source == source && r.target == target)
                    || (r.source == target && r.target == source)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyType {
    pub id: PropertyTypeId,
    pub owner: ElementType,
    pub name: String,
    pub kind: ValueKind,
    pub index: IndexKind,
}
