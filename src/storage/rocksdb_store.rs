/// RocksDB storage implementation
///
/// Key space design:
/// - GraphSeq:  m:graph_seq → next graph id (u64 LE)
/// - Catalog:   c:{graph} → empty
/// - Header:    g:{graph}:h → GraphHeader
/// - NodeType:  g:{graph}:n:{ntid} → NodeType
/// - EdgeType:  g:{graph}:e:{etid} → EdgeType
/// - Property:  g:{graph}:p:{ptid} → PropertyType
/// - Element:   g:{graph}:x:{eid} → ElementRecord
/// - Value:     g:{graph}:v:{ptid}:{eid} → PropertyBinding
/// - Index:     g:{graph}:i:{ptid}:{ordinal} → IndexEntry
///
/// Numeric key parts are zero padded so that prefix iteration returns
/// records in id order and index entries in value order.

use super::error::{StorageError, StorageResult};
use super::image::{GraphHeader, GraphImage, IMAGE_FORMAT_VERSION};
use crate::config::DatabaseConfig;
use crate::types::{ElementId, GraphId, PropertyTypeId};
use rocksdb::{
    Direction, IteratorMode, Options, ReadOptions, Snapshot, WriteBatch, WriteOptions, DB,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

const GRAPH_SEQ_KEY: &[u8] = b"m:graph_seq";
const CATALOG_PREFIX: &str = "c:";
const FIRST_GRAPH_ID: u64 = 1;

/// RocksDB-backed graph image storage
pub struct RocksDbStore {
    db: DB,
    path: PathBuf,
    sync_writes: bool,
}

impl RocksDbStore {
    /// Open (or create) the store described by `config`
    pub fn open(config: &DatabaseConfig) -> StorageResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(config.create_if_missing);

        let db = DB::open(&opts, &config.path)?;
        debug!(path = %config.path.display(), "opened rocksdb store");

        Ok(Self {
            db,
            path: config.path.clone(),
            sync_writes: config.sync_writes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Point-in-time view of the committed state
    pub fn snapshot(&self) -> Snapshot<'_> {
        self.db.snapshot()
    }

    /// Allocate the next graph id
    ///
    /// The counter is written immediately rather than staged, so an aborted
    /// transaction leaves a gap instead of handing the same id out twice.
    pub fn next_graph_id(&self) -> StorageResult<GraphId> {
        let current = match self.db.get(GRAPH_SEQ_KEY)? {
            Some(bytes) => decode_u64(&bytes)?,
            None => FIRST_GRAPH_ID,
        };

        let next = current
            .checked_add(1)
            .ok_or_else(|| StorageError::CounterOverflow("graph ids".to_string()))?;
        self.db.put(GRAPH_SEQ_KEY, next.to_le_bytes())?;

        Ok(GraphId::from_raw(current))
    }

    /// Stage a full graph image into `batch`
    ///
    /// Every record under the graph's prefix, committed or staged earlier in
    /// `batch`, is deleted first, so the committed result holds exactly
    /// `image`.
    ///
    /// # Returns
    /// * Number of records written
    pub fn stage_image(
        &self,
        batch: &mut WriteBatch,
        id: GraphId,
        image: &GraphImage,
    ) -> StorageResult<usize> {
        // Range delete also covers records put earlier in this same batch
        batch.delete_range(make_graph_prefix(id), make_graph_prefix_end(id));

        batch.put(make_catalog_key(id), b"");
        put_json(batch, make_header_key(id), &image.header)?;
        for node_type in &image.node_types {
            put_json(batch, make_record_key(id, 'n', node_type.id.as_raw().into()), node_type)?;
        }
        for edge_type in &image.edge_types {
            put_json(batch, make_record_key(id, 'e', edge_type.id.as_raw().into()), edge_type)?;
        }
        for property in &image.property_types {
            put_json(batch, make_record_key(id, 'p', property.id.as_raw().into()), property)?;
        }
        for record in &image.elements {
            put_json(batch, make_element_key(id, record.id()), record)?;
        }
        for binding in &image.bindings {
            put_json(batch, make_value_key(id, binding.property, binding.element), binding)?;
        }
        for (ordinal, entry) in image.index_entries.iter().enumerate() {
            put_json(batch, make_index_key(id, entry.property, ordinal), entry)?;
        }

        let written = image.record_count();
        debug!(graph = %id, written, "staged graph image");
        Ok(written)
    }

    /// Read a graph image, optionally as of `snapshot`
    ///
    /// # Returns
    /// * `Ok(None)` if no graph is stored under `id`
    pub fn load_image(
        &self,
        id: GraphId,
        snapshot: Option<&Snapshot<'_>>,
    ) -> StorageResult<Option<GraphImage>> {
        let mut read_opts = ReadOptions::default();
        if let Some(snapshot) = snapshot {
            read_opts.set_snapshot(snapshot);
        }

        let prefix = make_graph_prefix(id);
        let iter = self.db.iterator_opt(
            IteratorMode::From(prefix.as_bytes(), Direction::Forward),
            read_opts,
        );

        let mut header: Option<GraphHeader> = None;
        let mut image = GraphImage {
            header: GraphHeader {
                format_version: IMAGE_FORMAT_VERSION,
                schema_sequences: Default::default(),
                element_sequence: Default::default(),
            },
            node_types: Vec::new(),
            edge_types: Vec::new(),
            property_types: Vec::new(),
            elements: Vec::new(),
            bindings: Vec::new(),
            index_entries: Vec::new(),
        };

        for item in iter {
            let (key, value) = item?;
            let Some(rest) = key.strip_prefix(prefix.as_bytes()) else {
                break;
            };
            match rest.first() {
                Some(b'h') => header = Some(serde_json::from_slice(&value)?),
                Some(b'n') => image.node_types.push(serde_json::from_slice(&value)?),
                Some(b'e') => image.edge_types.push(serde_json::from_slice(&value)?),
                Some(b'p') => image.property_types.push(serde_json::from_slice(&value)?),
                Some(b'x') => image.elements.push(serde_json::from_slice(&value)?),
                Some(b'v') => image.bindings.push(serde_json::from_slice(&value)?),
                Some(b'i') => image.index_entries.push(serde_json::from_slice(&value)?),
                _ => {
                    return Err(StorageError::CorruptRecord(format!(
                        "unexpected key {}",
                        String::from_utf8_lossy(&key)
                    )))
                }
            }
        }

        let Some(header) = header else {
            return Ok(None);
        };
        if header.format_version != IMAGE_FORMAT_VERSION {
            return Err(StorageError::CorruptRecord(format!(
                "graph {} has format version {}, expected {}",
                id, header.format_version, IMAGE_FORMAT_VERSION
            )));
        }
        image.header = header;

        debug!(graph = %id, records = image.record_count(), "loaded graph image");
        Ok(Some(image))
    }

    /// Ids of all graphs with committed images, ascending
    pub fn graph_ids(&self) -> StorageResult<Vec<GraphId>> {
        let mut ids = Vec::new();
        for item in self
            .db
            .iterator(IteratorMode::From(CATALOG_PREFIX.as_bytes(), Direction::Forward))
        {
            let (key, _) = item?;
            let Some(rest) = key.strip_prefix(CATALOG_PREFIX.as_bytes()) else {
                break;
            };
            let raw = std::str::from_utf8(rest)?
                .parse::<u64>()
                .map_err(|e| StorageError::CorruptRecord(format!("catalog key: {}", e)))?;
            ids.push(GraphId::from_raw(raw));
        }
        Ok(ids)
    }

    /// Apply a staged batch atomically
    pub fn write(&self, batch: WriteBatch) -> StorageResult<()> {
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.sync_writes);
        self.db.write_opt(batch, &write_opts)?;
        Ok(())
    }
}

fn put_json<T: Serialize>(batch: &mut WriteBatch, key: String, record: &T) -> StorageResult<()> {
    batch.put(key.as_bytes(), serde_json::to_vec(record)?);
    Ok(())
}

fn decode_u64(bytes: &[u8]) -> StorageResult<u64> {
    let array: [u8; 8] = bytes.try_into().map_err(|_| {
        StorageError::CorruptRecord(format!("expected 8 bytes, got {}", bytes.len()))
    })?;
    Ok(u64::from_le_bytes(array))
}

/// Make key prefix shared by every record of a graph
fn make_graph_prefix(id: GraphId) -> String {
    format!("g:{:020}:", id.as_raw())
}

/// Exclusive upper bound of the graph prefix (`:` + 1 is `;`)
fn make_graph_prefix_end(id: GraphId) -> String {
    format!("g:{:020};", id.as_raw())
}

fn make_catalog_key(id: GraphId) -> String {
    format!("{}{:020}", CATALOG_PREFIX, id.as_raw())
}

fn make_header_key(id: GraphId) -> String {
    format!("{}h", make_graph_prefix(id))
}

/// Make key for a schema record (`n`, `e` or `p`)
fn make_record_key(id: GraphId, tag: char, raw: u64) -> String {
    format!("{}{}:{:010}", make_graph_prefix(id), tag, raw)
}

fn make_element_key(id: GraphId, element: ElementId) -> String {
    format!("{}x:{:020}", make_graph_prefix(id), element.as_raw())
}

fn make_value_key(id: GraphId, property: PropertyTypeId, element: ElementId) -> String {
    format!(
        "{}v:{:010}:{:020}",
        make_graph_prefix(id),
        property.as_raw(),
        element.as_raw()
    )
}

fn make_index_key(id: GraphId, property: PropertyTypeId, ordinal: usize) -> String {
    format!(
        "{}i:{:010}:{:010}",
        make_graph_prefix(id),
        property.as_raw(),
        ordinal
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{IndexKind, NodeType, PropertyType, SchemaSequences};
    use crate::storage::image::{IndexEntry, PropertyBinding};
    use crate::types::{ElementRecord, ElementType, Node, NodeTypeId, Sequence, Value, ValueKind};
    use tempfile::TempDir;

    fn create_test_store() -> (RocksDbStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = RocksDbStore::open(&DatabaseConfig::new(temp_dir.path())).unwrap();
        (store, temp_dir)
    }

    fn sample_image(names: &[&str]) -> GraphImage {
        let person = NodeTypeId::from_raw(0);
        let name = PropertyTypeId::from_raw(0);
        let elements: Vec<ElementRecord> = (0..names.len() as u64)
            .map(|i| {
                ElementRecord::Node(Node {
                    id: ElementId::from_raw(i),
                    node_type: person,
                })
            })
            .collect();
        let bindings: Vec<PropertyBinding> = names
            .iter()
            .enumerate()
            .map(|(i, n)| PropertyBinding {
                property: name,
                element: ElementId::from_raw(i as u64),
                value: Value::from(*n),
            })
            .collect();
        let mut index_entries: Vec<IndexEntry> = bindings
            .iter()
            .map(|b| IndexEntry {
                property: name,
                value: b.value.clone(),
                elements: vec![b.element],
            })
            .collect();
        index_entries.sort_by(|a, b| a.value.cmp(&b.value));

        GraphImage {
            header: GraphHeader {
                format_version: IMAGE_FORMAT_VERSION,
                schema_sequences: SchemaSequences {
                    node_types: Sequence::starting_at(1),
                    edge_types: Sequence::starting_at(0),
                    properties: Sequence::starting_at(1),
                },
                element_sequence: Sequence::starting_at(names.len() as u64),
            },
            node_types: vec![NodeType {
                id: person,
                name: "PERSON".to_string(),
            }],
            edge_types: Vec::new(),
            property_types: vec![PropertyType {
                id: name,
                owner: ElementType::Node(person),
                name: "NAME".to_string(),
                kind: ValueKind::Text,
                index: IndexKind::Unique,
            }],
            elements,
            bindings,
            index_entries,
        }
    }

    fn commit(store: &RocksDbStore, id: GraphId, image: &GraphImage) {
        let mut batch = WriteBatch::default();
        store.stage_image(&mut batch, id, image).unwrap();
        store.write(batch).unwrap();
    }

    #[test]
    fn test_graph_ids_start_at_one_and_increase() {
        let (store, _temp) = create_test_store();
        assert_eq!(store.next_graph_id().unwrap(), GraphId::from_raw(1));
        assert_eq!(store.next_graph_id().unwrap(), GraphId::from_raw(2));
    }

    #[test]
    fn test_graph_id_counter_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let config = DatabaseConfig::new(temp_dir.path());
        {
            let store = RocksDbStore::open(&config).unwrap();
            store.next_graph_id().unwrap();
            store.next_graph_id().unwrap();
        }
        let store = RocksDbStore::open(&config).unwrap();
        assert_eq!(store.next_graph_id().unwrap(), GraphId::from_raw(3));
    }

    #[test]
    fn test_image_round_trip() {
        let (store, _temp) = create_test_store();
        let id = store.next_graph_id().unwrap();
        let image = sample_image(&["Woody", "Sofia", "Scarlett"]);

        commit(&store, id, &image);

        let loaded = store.load_image(id, None).unwrap().unwrap();
        assert_eq!(loaded, image);
        assert_eq!(store.graph_ids().unwrap(), vec![id]);
    }

    #[test]
    fn test_missing_graph_is_none() {
        let (store, _temp) = create_test_store();
        assert!(store.load_image(GraphId::from_raw(42), None).unwrap().is_none());
    }

    #[test]
    fn test_restage_drops_stale_records() {
        let (store, _temp) = create_test_store();
        let id = store.next_graph_id().unwrap();

        commit(&store, id, &sample_image(&["a", "b", "c"]));
        let smaller = sample_image(&["z"]);
        commit(&store, id, &smaller);

        let loaded = store.load_image(id, None).unwrap().unwrap();
        assert_eq!(loaded, smaller);
    }

    #[test]
    fn test_restage_in_same_batch_drops_earlier_records() {
        let (store, _temp) = create_test_store();
        let id = store.next_graph_id().unwrap();

        let mut batch = WriteBatch::default();
        store
            .stage_image(&mut batch, id, &sample_image(&["a", "b", "c"]))
            .unwrap();
        let smaller = sample_image(&["z"]);
        store.stage_image(&mut batch, id, &smaller).unwrap();
        store.write(batch).unwrap();

        let loaded = store.load_image(id, None).unwrap().unwrap();
        assert_eq!(loaded, smaller);
    }

    #[test]
    fn test_graphs_do_not_overlap() {
        let (store, _temp) = create_test_store();
        let first = store.next_graph_id().unwrap();
        let second = store.next_graph_id().unwrap();

        commit(&store, first, &sample_image(&["a"]));
        commit(&store, second, &sample_image(&["b", "c"]));

        assert_eq!(store.load_image(first, None).unwrap().unwrap().elements.len(), 1);
        assert_eq!(store.load_image(second, None).unwrap().unwrap().elements.len(), 2);
        assert_eq!(store.graph_ids().unwrap(), vec![first, second]);
    }

    #[test]
    fn test_snapshot_hides_later_writes() {
        let (store, _temp) = create_test_store();
        let id = store.next_graph_id().unwrap();
        commit(&store, id, &sample_image(&["a"]));

        let snapshot = store.snapshot();
        commit(&store, id, &sample_image(&["a", "b"]));

        let old = store.load_image(id, Some(&snapshot)).unwrap().unwrap();
        assert_eq!(old.elements.len(), 1);
        let new = store.load_image(id, None).unwrap().unwrap();
        assert_eq!(new.elements.len(), 2);
    }

    #[test]
    fn test_uncommitted_batch_is_invisible() {
        let (store, _temp) = create_test_store();
        let id = store.next_graph_id().unwrap();

        let mut batch = WriteBatch::default();
        store.stage_image(&mut batch, id, &sample_image(&["a"])).unwrap();
        drop(batch);

        assert!(store.load_image(id, None).unwrap().is_none());
        assert!(store.graph_ids().unwrap().is_empty());
    }
}
