/// Data export utilities
///
/// Supports exporting a graph to:
/// - JSON files (the complete graph image, re-importable)
/// - CSV files (one file for nodes, one for edges; properties as a JSON object)

use super::ToolResult;
use crate::graph::Graph;
use crate::schema::TypeRegistry;
use crate::types::{ElementId, ElementRecord, ElementType, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Export options
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Pretty-print JSON output
    pub pretty_json: bool,
    /// Include header row in CSV
    pub csv_header: bool,
    /// Progress reporting interval
    pub progress_interval: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            pretty_json: true,
            csv_header: true,
            progress_interval: 10000,
        }
    }
}

/// Export the entire graph to a JSON file
///
/// # Returns
/// * Number of records in the written image
pub fn export_to_json<P: AsRef<Path>>(
    graph: &Graph,
    path: P,
    options: &ExportOptions,
) -> ToolResult<usize> {
    let image = graph.to_image()?;

    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    if options.pretty_json {
        serde_json::to_writer_pretty(&mut writer, &image)?;
    } else {
        serde_json::to_writer(&mut writer, &image)?;
    }
    writer.flush()?;

    let records = image.record_count();
    info!(path = %path.as_ref().display(), records, "exported graph to JSON");
    Ok(records)
}

/// Export the graph to CSV files (separate files for nodes and edges)
///
/// Node rows: `id,type,properties`.
/// Edge rows: `id,type,source,target,properties`.
///
/// # Returns
/// * `(nodes, edges)` written
pub fn export_to_csv<P: AsRef<Path>>(
    graph: &Graph,
    nodes_path: P,
    edges_path: P,
    options: &ExportOptions,
) -> ToolResult<(usize, usize)> {
    let image = graph.to_image()?;
    let schema = graph.schema()?;

    let mut nodes = csv::Writer::from_writer(File::create(nodes_path)?);
    let mut edges = csv::Writer::from_writer(File::create(edges_path)?);
    if options.csv_header {
        nodes.write_record(["id", "type", "properties"])?;
        edges.write_record(["id", "type", "source", "target", "properties"])?;
    }

    let mut node_count = 0;
    let mut edge_count = 0;
    for record in &image.elements {
        let properties = properties_json(graph, schema, record.id(), record.element_type())?;
        let type_name = schema
            .type_name(record.element_type())
            .unwrap_or_default()
            .to_string();

        match record {
            ElementRecord::Node(node) => {
                nodes.write_record([
                    node.id.as_raw().to_string(),
                    type_name,
                    properties,
                ])?;
                node_count += 1;
            }
            ElementRecord::Edge(edge) => {
                edges.write_record([
                    edge.id.as_raw().to_string(),
                    type_name,
                    edge.source.as_raw().to_string(),
                    edge.target.as_raw().to_string(),
                    properties,
                ])?;
                edge_count += 1;
            }
        }

        if (node_count + edge_count) % options.progress_interval.max(1) == 0 {
            info!(nodes = node_count, edges = edge_count, "export progress");
        }
    }

    nodes.flush()?;
    edges.flush()?;
    Ok((node_count, edge_count))
}

fn properties_json(
    graph: &Graph,
    schema: &TypeRegistry,
    element: ElementId,
    ty: ElementType,
) -> ToolResult<String> {
    let mut object = serde_json::Map::new();
    for property in schema.properties_of(ty) {
        if let Some(value) = graph.get_property(element, property.id)? {
            object.insert(property.name.clone(), plain_json(value));
        }
    }
    Ok(serde_json::Value::Object(object).to_string())
}

fn plain_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Boolean(b) => serde_json::Value::from(*b),
        Value::Integer(i) => serde_json::Value::from(*i),
        Value::Long(l) => serde_json::Value::from(*l),
        Value::Double(d) => serde_json::Value::from(*d),
        Value::Text(s) => serde_json::Value::from(s.as_str()),
    }
}
