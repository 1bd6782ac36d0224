/// Type Registry
///
/// Owns the node types, edge types and property types of one graph. Names are
/// unique within their category (node types and edge types are separate
/// namespaces, property names are unique within their owning type). Every
/// category allocates identifiers from its own monotonic `Sequence`.

pub mod types;

pub use types::{EdgeRestriction, EdgeType, IndexKind, NodeType, PropertyType};

use crate::error::{GraphError, GraphResult};
use crate::types::{EdgeTypeId, ElementType, NodeTypeId, PropertyTypeId, Sequence, ValueKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

const TYPE_ID_LIMIT: u64 = u32::MAX as u64;

/// Identifier sequences of the registry, persisted with the graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSequences {
    pub node_types: Sequence,
    pub edge_types: Sequence,
    pub properties: Sequence,
}

#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    node_types: BTreeMap<NodeTypeId, NodeType>,
    edge_types: BTreeMap<EdgeTypeId, EdgeType>,
    properties: BTreeMap<PropertyTypeId, PropertyType>,
    node_type_names: HashMap<String, NodeTypeId>,
    edge_type_names: HashMap<String, EdgeTypeId>,
    property_names: HashMap<(ElementType, String), PropertyTypeId>,
    sequences: SchemaSequences,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a new node type
    ///
    /// # Errors
    /// * `Schema` if the name is empty or already used by another node type
    pub fn define_node_type(&mut self, name: &str) -> GraphResult<NodeTypeId> {
        check_name(name)?;
        if self.node_type_names.contains_key(name) {
            return Err(GraphError::Schema(format!(
                "node type '{}' already exists",
                name
            )));
        }

        let raw = self.sequences.node_types.advance(TYPE_ID_LIMIT, "node types")?;
        let id = NodeTypeId::from_raw(raw as u32);
        self.insert_node_type(NodeType {
            id,
            name: name.to_string(),
        });
        Ok(id)
    }

    /// Define a new edge type
    ///
    /// # Arguments
    /// * `name` - Edge type name, unique among edge types
    /// * `directed` - Whether source/target order is significant
    /// * `restriction` - Optional `(source, target)` node type pair every edge
    ///   of this type must connect
    ///
    /// # Errors
    /// * `Schema` on a duplicate name or an unknown restriction node type
    pub fn define_edge_type(
        &mut self,
        name: &str,
        directed: bool,
        restriction: Option<(NodeTypeId, NodeTypeId)>,
    ) -> GraphResult<EdgeTypeId> {
        check_name(name)?;
        if self.edge_type_names.contains_key(name) {
            return Err(GraphError::Schema(format!(
                "edge type '{}' already exists",
                name
            )));
        }
        if let Some((source, target)) = restriction {
            for endpoint in [source, target] {
                if !self.node_types.contains_key(&endpoint) {
                    return Err(GraphError::Schema(format!(
                        "edge type '{}' restricted to unknown node type {}",
                        name, endpoint
                    )));
                }
            }
        }

        let raw = self.sequences.edge_types.advance(TYPE_ID_LIMIT, "edge types")?;
        let id = EdgeTypeId::from_raw(raw as u32);
        self.insert_edge_type(EdgeType {
            id,
            name: name.to_string(),
            directed,
            restriction: restriction.map(|(source, target)| EdgeRestriction { source, target }),
        });
        Ok(id)
    }

    /// Define a property on a node or edge type
    ///
    /// # Errors
    /// * `Schema` if the owner does not exist or already has a property with
    ///   this name
    pub fn define_property(
        &mut self,
        owner: ElementType,
        name: &str,
        kind: ValueKind,
        index: IndexKind,
    ) -> GraphResult<PropertyTypeId> {
        check_name(name)?;
        if !self.contains(owner) {
            return Err(GraphError::Schema(format!(
                "cannot define property '{}' on unknown {}",
                name, owner
            )));
        }
        if self
            .property_names
            .contains_key(&(owner, name.to_string()))
        {
            return Err(GraphError::Schema(format!(
                "property '{}' already exists on {}",
                name, owner
            )));
        }

        let raw = self.sequences.properties.advance(TYPE_ID_LIMIT, "property types")?;
        let id = PropertyTypeId::from_raw(raw as u32);
        self.insert_property(PropertyType {
            id,
            owner,
            name: name.to_string(),
            kind,
            index,
        });
        Ok(id)
    }

    pub fn find_node_type(&self, name: &str) -> Option<NodeTypeId> {
        self.node_type_names.get(name).copied()
    }

    pub fn find_edge_type(&self, name: &str) -> Option<EdgeTypeId> {
        self.edge_type_names.get(name).copied()
    }

    pub fn find_property_type(&self, owner: ElementType, name: &str) -> Option<PropertyTypeId> {
        self.property_names.get(&(owner, name.to_string())).copied()
    }

    pub fn node_type(&self, id: NodeTypeId) -> Option<&NodeType> {
        self.node_types.get(&id)
    }

    pub fn edge_type(&self, id: EdgeTypeId) -> Option<&EdgeType> {
        self.edge_types.get(&id)
    }

    pub fn property_type(&self, id: PropertyTypeId) -> Option<&PropertyType> {
        self.properties.get(&id)
    }

    /// Check whether a node or edge type exists
    pub fn contains(&self, ty: ElementType) -> bool {
        match ty {
            ElementType::Node(id) => self.node_types.contains_key(&id),
            ElementType::Edge(id) => self.edge_types.contains_key(&id),
        }
    }

    /// Human-readable name of a node or edge type
    pub fn type_name(&self, ty: ElementType) -> Option<&str> {
        match ty {
            ElementType::Node(id) => self.node_type(id).map(|t| t.name.as_str()),
            ElementType::Edge(id) => self.edge_type(id).map(|t| t.name.as_str()),
        }
    }

    pub fn node_types(&self) -> impl Iterator<Item = &NodeType> {
        self.node_types.values()
    }

    pub fn edge_types(&self) -> impl Iterator<Item = &EdgeType> {
        self.edge_types.values()
    }

    pub fn property_types(&self) -> impl Iterator<Item = &PropertyType> {
        self.properties.values()
    }

    /// Property types owned by `owner`, in definition order
    pub fn properties_of(&self, owner: ElementType) -> impl Iterator<Item = &PropertyType> {
        self.properties.values().filter(move |p| p.owner == owner)
    }

    pub fn sequences(&self) -> SchemaSequences {
        self.sequences
    }

    /// Rebuild a registry from persisted parts
    ///
    /// Validates name uniqueness, property owners, restriction endpoints and
    /// that every id lies below its sequence.
    pub fn restore(
        sequences: SchemaSequences,
        node_types: Vec<NodeType>,
        edge_types: Vec<EdgeType>,
        properties: Vec<PropertyType>,
    ) -> GraphResult<Self> {
        let mut registry = Self {
            sequences,
            ..Self::default()
        };

        for nt in node_types {
            if u64::from(nt.id.as_raw()) >= sequences.node_types.peek()
                || registry.node_type_names.contains_key(&nt.name)
            {
                return Err(GraphError::Schema(format!(
                    "invalid persisted node type {} '{}'",
                    nt.id, nt.name
                )));
            }
            registry.insert_node_type(nt);
        }

        for et in edge_types {
            let endpoints_known = et.restriction.map_or(true, |r| {
                registry.node_types.contains_key(&r.source)
                    && registry.node_types.contains_key(&r.target)
            });
            if u64::from(et.id.as_raw()) >= sequences.edge_types.peek()
                || registry.edge_type_names.contains_key(&et.name)
                || !endpoints_known
            {
                return Err(GraphError::Schema(format!(
                    "invalid persisted edge type {} '{}'",
                    et.id, et.name
                )));
            }
            registry.insert_edge_type(et);
        }

        for pt in properties {
            if u64::from(pt.id.as_raw()) >= sequences.properties.peek()
                || !registry.contains(pt.owner)
                || registry
                    .property_names
                    .contains_key(&(pt.owner, pt.name.clone()))
            {
                return Err(GraphError::Schema(format!(
                    "invalid persisted property type {} '{}'",
                    pt.id, pt.name
                )));
            }
            registry.insert_property(pt);
        }

        Ok(registry)
    }

    fn insert_node_type(&mut self, nt: NodeType) {
        self.node_type_names.insert(nt.name.clone(), nt.id);
        self.node_types.insert(nt.id, nt);
    }

    fn insert_edge_type(&mut self, et: EdgeType) {
        self.edge_type_names.insert(et.name.clone(), et.id);
        self.edge_types.insert(et.id, et);
    }

    fn insert_property(&mut self, pt: PropertyType) {
        self.property_names.insert((pt.owner, pt.name.clone()), pt.id);
        self.properties.insert(pt.id, pt);
    }
}

fn check_name(name: &str) -> GraphResult<()> {
    if name.trim().is_empty() {
        return Err(GraphError::Schema("type and property names must not be empty".into()));
    }
    Ok(())
}
