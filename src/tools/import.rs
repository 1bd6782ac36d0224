/// Data import utilities
///
/// Loads a JSON graph image (as written by `export_to_json`) into a new
/// graph of the current update transaction.

use super::{ToolError, ToolResult};
use crate::graph::Graph;
use crate::storage::{GraphImage, Session, IMAGE_FORMAT_VERSION};
use crate::types::ElementRecord;
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Import statistics
#[derive(Debug, Default, Clone, Serialize)]
pub struct ImportStats {
    pub nodes_imported: usize,
    pub edges_imported: usize,
    pub values_imported: usize,
}

/// Import a graph from a JSON image file
///
/// The imported graph is new: it gets its own id on its first `persist`.
pub fn import_from_json<P: AsRef<Path>>(
    session: &Session<'_>,
    path: P,
) -> ToolResult<(Graph, ImportStats)> {
    let file = File::open(path.as_ref())?;
    let image: GraphImage = serde_json::from_reader(BufReader::new(file))?;

    if image.header.format_version != IMAGE_FORMAT_VERSION {
        return Err(ToolError::InvalidFormat(format!(
            "format version {} (expected {})",
            image.header.format_version, IMAGE_FORMAT_VERSION
        )));
    }

    let nodes_imported = image
        .elements
        .iter()
        .filter(|r| matches!(r, ElementRecord::Node(_)))
        .count();
    let stats = ImportStats {
        nodes_imported,
        edges_imported: image.elements.len() - nodes_imported,
        values_imported: image.bindings.len(),
    };

    let graph = session.restore_graph(image)?;
    info!(
        path = %path.as_ref().display(),
        nodes = stats.nodes_imported,
        edges = stats.edges_imported,
        "imported graph from JSON"
    );
    Ok((graph, stats))
}
