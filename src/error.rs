//! Error taxonomy of the graph engine

use crate::storage::StorageError;
use crate::types::{ElementId, IdError, PropertyTypeId, Value, ValueKind};
use thiserror::Error;

/// Graph operation errors
///
/// Every error is reported synchronously at the offending call. Operations
/// validate before mutating, so an `Err` leaves the graph unchanged.
#[derive(Error, Debug)]
pub enum GraphError {
    /// Duplicate type/property name, unknown owner type, or a lookup path the
    /// property's index kind does not support
    #[error("Schema error: {0}")]
    Schema(String),

    /// Edge endpoint types violate the edge type's restriction
    #[error("Type restriction violated: {0}")]
    TypeRestriction(String),

    /// Unique property value already bound to another element
    #[error(
        "Uniqueness violation on {property}: value {value} is already bound to element {holder}"
    )]
    UniquenessViolation {
        property: PropertyTypeId,
        value: Value,
        holder: ElementId,
    },

    /// Value kind differs from the property's declared kind
    #[error("Kind mismatch on {property}: expected {expected}, got {actual}")]
    KindMismatch {
        property: PropertyTypeId,
        expected: ValueKind,
        actual: ValueKind,
    },

    /// Value of the right kind that cannot be stored (non-finite double)
    #[error("Invalid value for {property}: {reason}")]
    InvalidValue {
        property: PropertyTypeId,
        reason: String,
    },

    /// Nonexistent name, type, property, element or graph
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation attempted outside an Active transaction of the required mode,
    /// or a second concurrent update transaction
    #[error("Transaction state error: {0}")]
    TransactionState(String),

    /// Durable storage failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<IdError> for GraphError {
    fn from(err: IdError) -> Self {
        GraphError::Schema(err.to_string())
    }
}

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;
