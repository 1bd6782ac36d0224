/// Data import and export tools
///
/// This module provides utilities for dumping graphs to portable files and
/// loading them back into a database.

pub mod import;
pub mod export;

pub use import::{ImportStats, import_from_json};
pub use export::{ExportOptions, export_to_csv, export_to_json};

use thiserror::Error;

/// Import/export errors
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Graph error: {0}")]
    GraphError(#[from] crate::error::GraphError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

pub type ToolResult<T> = Result<T, ToolError>;
