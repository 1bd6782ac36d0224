/// Rust Property Graph
///
/// An embedded, typed, indexed property-graph database with transactional
/// persistence on RocksDB.
///
/// # Architecture
///
/// ```text
/// ┌──────────────────────────────────────────────────┐
/// │           Rust Property Graph                    │
/// ├──────────────────────────────────────────────────┤
/// │  ┌────────────────────────────────┐              │
/// │  │   Graph facade                 │              │
/// │  └──┬──────────┬──────────┬───────┘              │
/// │     ↓          ↓          ↓                       │
/// │  ┌────────┐ ┌───────────┐ ┌────────────┐         │
/// │  │ Schema │ │ Elements  │ │ Properties │         │
/// │  │        │ │ adjacency │ │ indexes    │         │
/// │  └────────┘ └─────┬─────┘ └────────────┘         │
/// │                 ↓                                 │
/// │  ┌────────────────────────────────┐              │
/// │  │   Traversal (rayon)            │              │
/// │  └────────────────────────────────┘              │
/// │  ┌────────────────────────────────┐              │
/// │  │   Sessions / transactions      │              │
/// │  └────────────┬───────────────────┘              │
/// │               ↓                                   │
/// │  ┌────────────────────────────────┐              │
/// │  │   Storage Engine (RocksDB)     │              │
/// │  └────────────────────────────────┘              │
/// └──────────────────────────────────────────────────┘
/// ```
///
/// # Modules
///
/// - `types`: Identifiers, values, node and edge records
/// - `schema`: Type registry (node, edge and property types)
/// - `property`: Property columns and their value indexes
/// - `element`: Element arena and adjacency lists
/// - `traversal`: Neighbor expansion and set combinators
/// - `graph`: The `Graph` facade tying the above together
/// - `storage`: Database, sessions and RocksDB persistence
/// - `config`: Environment-driven configuration and logging setup
/// - `tools`: Utilities (JSON/CSV export, JSON import)

pub mod config;
pub mod element;
pub mod error;
pub mod graph;
pub mod property;
pub mod schema;
pub mod storage;
pub mod tools;
pub mod traversal;
pub mod types;

// Re-export commonly used types
pub use types::{
    Edge, EdgeTypeId, ElementId, ElementRecord, ElementType, GraphId, Node, NodeTypeId,
    PropertyTypeId, Value, ValueKind,
};

pub use error::{GraphError, GraphResult};
pub use graph::Graph;
pub use schema::{EdgeType, IndexKind, NodeType, PropertyType, TypeRegistry};
pub use traversal::{difference, intersect, union, Direction, ElementSet};

// Re-export storage types
pub use storage::{Database, GraphImage, Session, StorageError, StorageResult, TxMode};

pub use config::{Config, DatabaseConfig, LoggingConfig};

// Re-export tool types
pub use tools::{
    export_to_csv, export_to_json, import_from_json, ExportOptions, ImportStats, ToolError,
    ToolResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
