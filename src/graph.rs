/// Graph facade
///
/// A `Graph` bundles the type registry, element store and property store of
/// one graph and exposes the public operations on them. Every operation
/// checks the transaction state of the session that produced the graph:
/// reads need an active transaction, mutations an update transaction.

use crate::element::ElementStore;
use crate::error::{GraphError, GraphResult};
use crate::property::PropertyStore;
use crate::schema::{EdgeType, IndexKind, PropertyType, TypeRegistry};
use crate::storage::{
    GraphHeader, GraphImage, IndexEntry, PropertyBinding, TxControl, IMAGE_FORMAT_VERSION,
};
use crate::traversal::{self, parallel_filter, Direction, ElementSet, PARALLEL_EXPANSION_THRESHOLD};
use crate::types::{
    Edge, EdgeTypeId, ElementId, ElementType, GraphId, NodeTypeId, PropertyTypeId, Value,
    ValueKind,
};
use std::collections::HashMap;
use std::ops::RangeBounds;
use std::sync::Arc;

#[derive(Debug)]
pub struct Graph {
    id: Option<GraphId>,
    control: Arc<TxControl>,
    schema: TypeRegistry,
    elements: ElementStore,
    properties: PropertyStore,
}

impl Graph {
    pub(crate) fn new(control: Arc<TxControl>) -> Self {
        Self {
            id: None,
            control,
            schema: TypeRegistry::new(),
            elements: ElementStore::new(),
            properties: PropertyStore::new(),
        }
    }

    /// Id under which the graph was persisted or opened, `None` before the
    /// first `persist`
    pub fn id(&self) -> Option<GraphId> {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: GraphId) {
        self.id = Some(id);
    }

    pub(crate) fn is_bound_to(&self, control: &Arc<TxControl>) -> bool {
        Arc::ptr_eq(&self.control, control)
    }

    // ==================== Schema ====================

    pub fn define_node_type(&mut self, name: &str) -> GraphResult<NodeTypeId> {
        self.control.require_update("define_node_type")?;
        self.schema.define_node_type(name)
    }

    /// Define an edge type, optionally restricted to a `(source, target)`
    /// pair of node types
    pub fn define_edge_type(
        &mut self,
        name: &str,
        directed: bool,
        restriction: Option<(NodeTypeId, NodeTypeId)>,
    ) -> GraphResult<EdgeTypeId> {
        self.control.require_update("define_edge_type")?;
        self.schema.define_edge_type(name, directed, restriction)
    }

    /// Define a property on a node or edge type
    ///
    /// The property's storage (and index, unless `IndexKind::Basic`) exists
    /// as soon as this returns.
    pub fn define_property(
        &mut self,
        owner: impl Into<ElementType>,
        name: &str,
        kind: ValueKind,
        index: IndexKind,
    ) -> GraphResult<PropertyTypeId> {
        self.control.require_update("define_property")?;
        let id = self.schema.define_property(owner.into(), name, kind, index)?;
        if let Some(property) = self.schema.property_type(id) {
            self.properties.add_column(property);
        }
        Ok(id)
    }

    pub fn find_node_type(&self, name: &str) -> GraphResult<NodeTypeId> {
        self.control.require_active("find_node_type")?;
        self.schema
            .find_node_type(name)
            .ok_or_else(|| GraphError::NotFound(format!("node type '{}'", name)))
    }

    pub fn find_edge_type(&self, name: &str) -> GraphResult<EdgeTypeId> {
        self.control.require_active("find_edge_type")?;
        self.schema
            .find_edge_type(name)
            .ok_or_else(|| GraphError::NotFound(format!("edge type '{}'", name)))
    }

    pub fn find_property_type(
        &self,
        owner: impl Into<ElementType>,
        name: &str,
    ) -> GraphResult<PropertyTypeId> {
        self.control.require_active("find_property_type")?;
        let owner = owner.into();
        self.schema
            .find_property_type(owner, name)
            .ok_or_else(|| GraphError::NotFound(format!("property '{}' of {}", name, owner)))
    }

    /// Read access to the type registry
    pub fn schema(&self) -> GraphResult<&TypeRegistry> {
        self.control.require_active("schema")?;
        Ok(&self.schema)
    }

    // ==================== Elements ====================

    pub fn new_node(&mut self, node_type: NodeTypeId) -> GraphResult<ElementId> {
        self.control.require_update("new_node")?;
        self.elements.new_node(&self.schema, node_type)
    }

    /// Create an edge between two existing nodes
    ///
    /// Undirected edges are stored with the lower element id as source.
    pub fn new_edge(
        &mut self,
        edge_type: EdgeTypeId,
        source: ElementId,
        target: ElementId,
    ) -> GraphResult<ElementId> {
        self.control.require_update("new_edge")?;
        self.elements.new_edge(&self.schema, edge_type, source, target)
    }

    pub fn element_type(&self, element: ElementId) -> GraphResult<ElementType> {
        self.control.require_active("element_type")?;
        self.elements
            .type_of(element)
            .ok_or_else(|| GraphError::NotFound(format!("element {}", element)))
    }

    /// Edge record, including its endpoints
    pub fn edge(&self, edge: ElementId) -> GraphResult<Edge> {
        self.control.require_active("edge")?;
        self.elements.edge(edge).copied()
    }

    /// Every element of a node or edge type, in creation order
    pub fn all_elements_of_type(&self, ty: impl Into<ElementType>) -> GraphResult<&[ElementId]> {
        self.control.require_active("all_elements_of_type")?;
        let ty = ty.into();
        if !self.schema.contains(ty) {
            return Err(GraphError::NotFound(ty.to_string()));
        }
        Ok(self.elements.elements_of_type(ty))
    }

    pub fn node_count(&self) -> GraphResult<usize> {
        self.control.require_active("node_count")?;
        Ok(self.elements.node_count())
    }

    pub fn edge_count(&self) -> GraphResult<usize> {
        self.control.require_active("edge_count")?;
        Ok(self.elements.edge_count())
    }

    // ==================== Properties ====================

    /// Bind `value` to `element` for `property`
    ///
    /// Setting the value an element already holds is a no-op.
    ///
    /// # Errors
    /// * `NotFound` if the element or property does not exist
    /// * `Schema` if the property is not defined on the element's type
    /// * `KindMismatch` if the value kind differs from the property's kind
    /// * `UniquenessViolation` if the property is Unique and another element
    ///   already holds the value
    pub fn set_property(
        &mut self,
        element: ElementId,
        property: PropertyTypeId,
        value: impl Into<Value>,
    ) -> GraphResult<()> {
        self.control.require_update("set_property")?;
        self.check_owner(element, property)?;
        self.properties.set(element, property, value.into())?;
        Ok(())
    }

    pub fn get_property(
        &self,
        element: ElementId,
        property: PropertyTypeId,
    ) -> GraphResult<Option<&Value>> {
        self.control.require_active("get_property")?;
        self.check_owner(element, property)?;
        self.properties.get(element, property)
    }

    /// Clear a binding, returning the removed value
    pub fn remove_property(
        &mut self,
        element: ElementId,
        property: PropertyTypeId,
    ) -> GraphResult<Option<Value>> {
        self.control.require_update("remove_property")?;
        self.check_owner(element, property)?;
        self.properties.remove(element, property)
    }

    /// The single element holding `value` for a Unique property
    pub fn find_by_unique(
        &self,
        property: PropertyTypeId,
        value: impl Into<Value>,
    ) -> GraphResult<Option<ElementId>> {
        self.control.require_active("find_by_unique")?;
        self.properties.find_unique(property, &value.into())
    }

    /// Every element holding `value` for an Indexed or Unique property
    pub fn find_by_indexed(
        &self,
        property: PropertyTypeId,
        value: impl Into<Value>,
    ) -> GraphResult<ElementSet> {
        self.control.require_active("find_by_indexed")?;
        self.properties.find_indexed(property, &value.into())
    }

    /// Every element whose value lies in `range`, for an Indexed or Unique
    /// property
    pub fn find_range<R>(&self, property: PropertyTypeId, range: R) -> GraphResult<ElementSet>
    where
        R: RangeBounds<Value>,
    {
        self.control.require_active("find_range")?;
        self.properties.find_range(property, range)
    }

    /// Every element holding `value`, through the index when there is one
    /// and by scanning the owner type's elements otherwise
    pub fn find_elements(
        &self,
        property: PropertyTypeId,
        value: impl Into<Value>,
    ) -> GraphResult<ElementSet> {
        self.control.require_active("find_elements")?;
        let value = value.into();
        let column = self.properties.column(property)?;
        if column.index_kind().is_indexed() {
            return self.properties.find_indexed(property, &value);
        }

        let owner = self.property_type(property)?.owner;
        let expected = self.property_type(property)?.kind;
        if value.kind() != expected {
            return Err(GraphError::KindMismatch {
                property,
                expected,
                actual: value.kind(),
            });
        }

        let candidates = self.elements.elements_of_type(owner);
        let matches = |id: ElementId| column.get(id) == Some(&value);
        if candidates.len() >= PARALLEL_EXPANSION_THRESHOLD {
            Ok(parallel_filter(candidates, matches).into_iter().collect())
        } else {
            Ok(candidates.iter().copied().filter(|&id| matches(id)).collect())
        }
    }

    // ==================== Traversal ====================

    /// Nodes adjacent to `from` across `edge_type`
    ///
    /// For undirected edge types the direction is ignored.
    pub fn neighbors(
        &self,
        from: ElementId,
        edge_type: EdgeTypeId,
        direction: Direction,
    ) -> GraphResult<ElementSet> {
        self.control.require_active("neighbors")?;
        let et = self.edge_type(edge_type)?;
        self.elements.node(from)?;
        Ok(traversal::neighbors(&self.elements, from, et, direction))
    }

    /// Union of the neighbors of every member of `from`
    ///
    /// Members that are not nodes contribute nothing.
    pub fn neighbors_of_set(
        &self,
        from: &ElementSet,
        edge_type: EdgeTypeId,
        direction: Direction,
    ) -> GraphResult<ElementSet> {
        self.control.require_active("neighbors_of_set")?;
        let et = self.edge_type(edge_type)?;
        Ok(traversal::neighbors_of_set(&self.elements, from, et, direction))
    }

    /// Edges of `edge_type` incident to `node`
    pub fn explode(
        &self,
        node: ElementId,
        edge_type: EdgeTypeId,
        direction: Direction,
    ) -> GraphResult<ElementSet> {
        self.control.require_active("explode")?;
        let et = self.edge_type(edge_type)?;
        self.elements.node(node)?;
        Ok(traversal::explode(&self.elements, node, et, direction))
    }

    pub fn degree(
        &self,
        node: ElementId,
        edge_type: EdgeTypeId,
        direction: Direction,
    ) -> GraphResult<usize> {
        self.control.require_active("degree")?;
        let et = self.edge_type(edge_type)?;
        self.elements.node(node)?;
        Ok(traversal::degree(&self.elements, node, et, direction))
    }

    // ==================== Images ====================

    /// Complete serializable form of the graph
    pub fn to_image(&self) -> GraphResult<GraphImage> {
        self.control.require_active("to_image")?;

        let mut bindings = Vec::new();
        let mut index_entries = Vec::new();
        for property in self.schema.property_types() {
            let column = self.properties.column(property.id)?;
            bindings.extend(column.bindings().into_iter().map(|(element, value)| {
                PropertyBinding {
                    property: property.id,
                    element,
                    value: value.clone(),
                }
            }));
            if let Some(index) = column.index() {
                index_entries.extend(index.entries().map(|(value, elements)| IndexEntry {
                    property: property.id,
                    value: value.clone(),
                    elements: elements.iter().copied().collect(),
                }));
            }
        }

        Ok(GraphImage {
            header: GraphHeader {
                format_version: IMAGE_FORMAT_VERSION,
                schema_sequences: self.schema.sequences(),
                element_sequence: self.elements.sequence(),
            },
            node_types: self.schema.node_types().cloned().collect(),
            edge_types: self.schema.edge_types().cloned().collect(),
            property_types: self.schema.property_types().cloned().collect(),
            elements: self.elements.records().copied().collect(),
            bindings,
            index_entries,
        })
    }

    /// Rebuild a graph from its image
    ///
    /// # Errors
    /// * `Schema` if the image is internally inconsistent
    pub(crate) fn from_image(
        image: GraphImage,
        control: Arc<TxControl>,
        id: Option<GraphId>,
    ) -> GraphResult<Self> {
        let GraphImage {
            header,
            node_types,
            edge_types,
            property_types,
            elements,
            bindings,
            index_entries,
        } = image;

        let schema = TypeRegistry::restore(
            header.schema_sequences,
            node_types,
            edge_types,
            property_types,
        )?;
        let elements = ElementStore::restore(&schema, header.element_sequence, elements)?;

        let mut values: HashMap<PropertyTypeId, Vec<(ElementId, Value)>> = HashMap::new();
        for binding in bindings {
            let property = schema.property_type(binding.property).ok_or_else(|| {
                GraphError::Schema(format!("binding for unknown property {}", binding.property))
            })?;
            if elements.type_of(binding.element) != Some(property.owner) {
                return Err(GraphError::Schema(format!(
                    "binding of {} on element {} outside {}",
                    property.id, binding.element, property.owner
                )));
            }
            values
                .entry(binding.property)
                .or_default()
                .push((binding.element, binding.value));
        }

        let mut entries: HashMap<PropertyTypeId, Vec<(Value, Vec<ElementId>)>> = HashMap::new();
        for entry in index_entries {
            entries
                .entry(entry.property)
                .or_default()
                .push((entry.value, entry.elements));
        }

        let mut properties = PropertyStore::new();
        for property in schema.property_types() {
            properties.restore_column(
                property,
                values.remove(&property.id).unwrap_or_default(),
                entries.remove(&property.id).unwrap_or_default(),
            )?;
        }
        if let Some(orphan) = entries.keys().next() {
            return Err(GraphError::Schema(format!(
                "index entries for unknown property {}",
                orphan
            )));
        }

        Ok(Self {
            id,
            control,
            schema,
            elements,
            properties,
        })
    }

    fn edge_type(&self, id: EdgeTypeId) -> GraphResult<&EdgeType> {
        self.schema
            .edge_type(id)
            .ok_or_else(|| GraphError::NotFound(format!("edge type {}", id)))
    }

    fn property_type(&self, id: PropertyTypeId) -> GraphResult<&PropertyType> {
        self.schema
            .property_type(id)
            .ok_or_else(|| GraphError::NotFound(format!("property type {}", id)))
    }

    fn check_owner(&self, element: ElementId, property: PropertyTypeId) -> GraphResult<()> {
        let owner = self.property_type(property)?.owner;
        let actual = self
            .elements
            .type_of(element)
            .ok_or_else(|| GraphError::NotFound(format!("element {}", element)))?;
        if actual != owner {
            return Err(GraphError::Schema(format!(
                "property {} belongs to {}, element {} is {}",
                property, owner, element, actual
            )));
        }
        Ok(())
    }
}
