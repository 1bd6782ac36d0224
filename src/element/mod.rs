/// Element Store
///
/// Owns node and edge records in an append-only arena indexed by
/// `ElementId`, the per-type element lists used for full scans, and the
/// per-node, per-edge-type adjacency lists the traversal engine walks.

use crate::error::{GraphError, GraphResult};
use crate::schema::TypeRegistry;
use crate::types::{
    Edge, EdgeTypeId, ElementId, ElementRecord, ElementType, Node, NodeTypeId, Sequence,
};
use std::collections::HashMap;

/// Edges of one type incident to one node, as `(edge, peer)` pairs
///
/// An edge appears in `outgoing` of its source and `incoming` of its target.
/// A self-loop appears in both lists of the same node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Incidence {
    pub outgoing: Vec<(ElementId, ElementId)>,
    pub incoming: Vec<(ElementId, ElementId)>,
}

#[derive(Debug, Clone, Default)]
pub struct ElementStore {
    elements: Vec<ElementRecord>,
    by_type: HashMap<ElementType, Vec<ElementId>>,
    adjacency: HashMap<ElementId, HashMap<EdgeTypeId, Incidence>>,
    sequence: Sequence,
}

impl ElementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node of the given type
    pub fn new_node(
        &mut self,
        schema: &TypeRegistry,
        node_type: NodeTypeId,
    ) -> GraphResult<ElementId> {
        if schema.node_type(node_type).is_none() {
            return Err(GraphError::NotFound(format!("node type {}", node_type)));
        }

        let id = self.allocate()?;
        self.push(ElementRecord::Node(Node { id, node_type }));
        Ok(id)
    }

    /// Create an edge between two existing nodes
    ///
    /// # Errors
    /// * `NotFound` if the edge type or either endpoint node does not exist
    /// * `TypeRestriction` if the edge type is restricted and the endpoint
    ///   node types do not match the restriction
    pub fn new_edge(
        &mut self,
        schema: &TypeRegistry,
        edge_type: EdgeTypeId,
        source: ElementId,
        target: ElementId,
    ) -> GraphResult<ElementId> {
        let et = schema
            .edge_type(edge_type)
            .ok_or_else(|| GraphError::NotFound(format!("edge type {}", edge_type)))?;
        let source_type = self.node(source)?.node_type;
        let target_type = self.node(target)?.node_type;

        if !et.admits(source_type, target_type) {
            let name = |ty: NodeTypeId| {
                schema
                    .node_type(ty)
                    .map(|t| t.name.clone())
                    .unwrap_or_else(|| ty.to_string())
            };
            return Err(GraphError::TypeRestriction(format!(
                "edge type '{}' does not accept {} -> {}",
                et.name,
                name(source_type),
                name(target_type)
            )));
        }

        let (source, target) = if !et.directed && source > target {
            (target, source)
        } else {
            (source, target)
        };

        let id = self.allocate()?;
        let edge = Edge {
            id,
            edge_type,
            source,
            target,
        };
        self.link(&edge);
        self.push(ElementRecord::Edge(edge));
        Ok(id)
    }

    pub fn element(&self, id: ElementId) -> Option<&ElementRecord> {
        self.elements.get(id.slot())
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.element(id).is_some()
    }

    pub fn type_of(&self, id: ElementId) -> Option<ElementType> {
        self.element(id).map(ElementRecord::element_type)
    }

    pub fn node(&self, id: ElementId) -> GraphResult<&Node> {
        self.element(id)
            .and_then(ElementRecord::as_node)
            .ok_or_else(|| GraphError::NotFound(format!("node {}", id)))
    }

    pub fn edge(&self, id: ElementId) -> GraphResult<&Edge> {
        self.element(id)
            .and_then(ElementRecord::as_edge)
            .ok_or_else(|| GraphError::NotFound(format!("edge {}", id)))
    }

    /// Every element of a node or edge type, in creation order
    pub fn elements_of_type(&self, ty: ElementType) -> &[ElementId] {
        self.by_type.get(&ty).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Adjacency of `node` restricted to one edge type
    pub fn incidence(&self, node: ElementId, edge_type: EdgeTypeId) -> Option<&Incidence> {
        self.adjacency.get(&node).and_then(|by_type| by_type.get(&edge_type))
    }

    pub fn records(&self) -> impl Iterator<Item = &ElementRecord> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.elements.iter().filter(|r| r.as_node().is_some()).count()
    }

    pub fn edge_count(&self) -> usize {
        self.elements.len() - self.node_count()
    }

    pub fn sequence(&self) -> Sequence {
        self.sequence
    }

    /// Rebuild the store from persisted records
    ///
    /// Records must be dense (record `n` has id `n`) and reference known
    /// types; edges must connect existing nodes. Restrictions are not
    /// re-checked: they apply at creation time only.
    pub fn restore(
        schema: &TypeRegistry,
        sequence: Sequence,
        records: Vec<ElementRecord>,
    ) -> GraphResult<Self> {
        if records.len() as u64 != sequence.peek() {
            return Err(GraphError::Schema(format!(
                "persisted element sequence {} does not match {} records",
                sequence.peek(),
                records.len()
            )));
        }

        let mut store = Self {
            sequence,
            ..Self::default()
        };
        for (slot, record) in records.iter().enumerate() {
            if record.id().slot() != slot {
                return Err(GraphError::Schema(format!(
                    "persisted element {} found at slot {}",
                    record.id(),
                    slot
                )));
            }
            if !schema.contains(record.element_type()) {
                return Err(GraphError::Schema(format!(
                    "persisted element {} has unknown {}",
                    record.id(),
                    record.element_type()
                )));
            }
            store.push(*record);
        }

        for record in &records {
            if let ElementRecord::Edge(edge) = record {
                store.node(edge.source)?;
                store.node(edge.target)?;
                store.link(edge);
            }
        }

        Ok(store)
    }

    fn allocate(&mut self) -> GraphResult<ElementId> {
        let raw = self.sequence.advance(u64::MAX, "elements")?;
        Ok(ElementId::from_raw(raw))
    }

    fn push(&mut self, record: ElementRecord) {
        self.by_type
            .entry(record.element_type())
            .or_default()
            .push(record.id());
        self.elements.push(record);
    }

    fn link(&mut self, edge: &Edge) {
        self.adjacency
            .entry(edge.source)
            .or_default()
            .entry(edge.edge_type)
            .or_default()
            .outgoing
            .push((edge.id, edge.target));
        self.adjacency
            .entry(edge.target)
            .or_default()
            .entry(edge.edge_type)
            .or_default()
            .incoming
            .push((edge.id, edge.source));
    }
}
