use super::ids::{EdgeTypeId, ElementId, NodeTypeId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type tag of an element: either a node type or an edge type
///
/// Also used as the owner of a property type.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum ElementType {
    Node(NodeTypeId),
    Edge(EdgeTypeId),
}

impl From<NodeTypeId> for ElementType {
    fn from(id: NodeTypeId) -> Self {
        ElementType::Node(id)
    }
}

impl From<EdgeTypeId> for ElementType {
    fn from(id: EdgeTypeId) -> Self {
        ElementType::Edge(id)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Node(id) => write!(f, "node type {}", id),
            ElementType::Edge(id) => write!(f, "edge type {}", id),
        }
    }
}

/// Node in the graph
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Node {
    pub id: ElementId,
    pub node_type: NodeTypeId,
}

/// Edge in the graph
///
/// Directed edges keep `source -> target` as created. Undirected edges are
/// stored with the lower element id as `source`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Edge {
    pub id: ElementId,
    pub edge_type: EdgeTypeId,
    pub source: ElementId,
    pub target: ElementId,
}

impl Edge {
    /// Check if this edge is a self-loop
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    /// The endpoint opposite to `node`, or `None` if `node` is not an endpoint
    pub fn peer(&self, node: ElementId) -> Option<ElementId> {
        if self.source == node {
            Some(self.target)
        } else if self.target == node {
            Some(self.source)
        } else {
            None
        }
    }
}

/// A stored element: one slot of the element arena
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ElementRecord {
    Node(Node),
    Edge(Edge),
}

impl ElementRecord {
    pub fn id(&self) -> ElementId {
        match self {
            ElementRecord::Node(n) => n.id,
            ElementRecord::Edge(e) => e.id,
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            ElementRecord::Node(n) => ElementType::Node(n.node_type),
            ElementRecord::Edge(e) => ElementType::Edge(e.edge_type),
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            ElementRecord::Node(n) => Some(n),
            ElementRecord::Edge(_) => None,
        }
    }

    pub fn as_edge(&self) -> Option<&Edge> {
        match self {
            ElementRecord::Edge(e) => Some(e),
            ElementRecord::Node(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(source: u64, target: u64) -> Edge {
        Edge {
            id: ElementId::from_raw(10),
            edge_type: EdgeTypeId::from_raw(0),
            source: ElementId::from_raw(source),
            target: ElementId::from_raw(target),
        }
    }

    #[test]
    fn test_edge_peer() {
        let e = edge(1, 2);
        assert_eq!(e.peer(ElementId::from_raw(1)), Some(ElementId::from_raw(2)));
        assert_eq!(e.peer(ElementId::from_raw(2)), Some(ElementId::from_raw(1)));
        assert_eq!(e.peer(ElementId::from_raw(3)), None);
    }

    #[test]
    fn test_edge_is_self_loop() {
        assert!(edge(4, 4).is_self_loop());
        assert!(!edge(4, 5).is_self_loop());
    }

    #[test]
    fn test_record_type_tag() {
        let node = ElementRecord::Node(Node {
            id: ElementId::from_raw(0),
            node_type: NodeTypeId::from_raw(1),
        });
        assert_eq!(node.element_type(), ElementType::Node(NodeTypeId::from_raw(1)));
        assert!(node.as_edge().is_none());

        let e = ElementRecord::Edge(edge(0, 1));
        assert_eq!(e.element_type(), ElementType::Edge(EdgeTypeId::from_raw(0)));
        assert_eq!(e.id(), ElementId::from_raw(10));
    }

    #[test]
    fn test_record_serialization() {
        let record = ElementRecord::Edge(edge(3, 9));
        let serialized = serde_json::to_string(&record).unwrap();
        let deserialized: ElementRecord = serde_json::from_str(&serialized).unwrap();
        assert_eq!(record, deserialized);
    }
}
