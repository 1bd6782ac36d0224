/// Core data types for the graph engine
///
/// This module defines the fundamental types used throughout the system:
/// - Identifiers: NodeTypeId, EdgeTypeId, PropertyTypeId, ElementId, GraphId
/// - Value: closed, totally ordered property value with its ValueKind
/// - Node / Edge: element records stored in the element arena

pub mod element;
pub mod ids;
pub mod value;

pub use element::{Edge, ElementRecord, ElementType, Node};
pub use ids::{EdgeTypeId, ElementId, GraphId, IdError, NodeTypeId, PropertyTypeId, Sequence};
pub use value::{Value, ValueKind};
