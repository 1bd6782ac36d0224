//! Serializable image of a whole graph
//!
//! The image is what `persist` writes and `open` reads back: schema,
//! identifier sequences, element records, property bindings and index
//! entries. It is also the JSON dump format of the export tools.

use crate::schema::{EdgeType, NodeType, PropertyType, SchemaSequences};
use crate::types::{ElementId, ElementRecord, PropertyTypeId, Sequence, Value};
use serde::{Deserialize, Serialize};

/// Bumped whenever the record layout changes
pub const IMAGE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphHeader {
    pub format_version: u32,
    pub schema_sequences: SchemaSequences,
    pub element_sequence: Sequence,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyBinding {
    pub property: PropertyTypeId,
    pub element: ElementId,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub property: PropertyTypeId,
    pub value: Value,
    pub elements: Vec<ElementId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphImage {
    pub header: GraphHeader,
    pub node_types: Vec<NodeType>,
    pub edge_types: Vec<EdgeType>,
    pub property_types: Vec<PropertyType>,
    pub elements: Vec<ElementRecord>,
    pub bindings: Vec<PropertyBinding>,
    pub index_entries: Vec<IndexEntry>,
}

impl GraphImage {
    /// Number of records the image occupies in the key space
    pub fn record_count(&self) -> usize {
        1 + self.node_types.len()
            + self.edge_types.len()
            + self.property_types.len()
            + self.elements.len()
            + self.bindings.len()
            + self.index_entries.len()
    }
}
