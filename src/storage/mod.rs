/// Transaction & Persistence layer
///
/// This module provides durable storage for whole graphs:
/// - Database: owns the RocksDB store and the update lock
/// - Session: one transaction at a time (read or update)
/// - GraphImage: the persisted form of a graph

pub mod error;
pub mod image;
pub mod rocksdb_store;
pub mod transaction;

pub use error::{StorageError, StorageResult};
pub use image::{GraphHeader, GraphImage, IndexEntry, PropertyBinding, IMAGE_FORMAT_VERSION};
pub use rocksdb_store::RocksDbStore;
pub use transaction::{Session, TxControl, TxMode};

use crate::config::DatabaseConfig;
use crate::types::GraphId;
use parking_lot::Mutex;
use std::path::Path;
use tracing::info;

/// An open graph database
///
/// Any number of sessions may run read transactions concurrently; at most
/// one session at a time runs an update transaction.
pub struct Database {
    store: RocksDbStore,
    update_lock: Mutex<()>,
    config: DatabaseConfig,
}

impl Database {
    /// Open the database described by `config`
    pub fn open(config: DatabaseConfig) -> StorageResult<Self> {
        let store = RocksDbStore::open(&config)?;
        info!(path = %config.path.display(), sync_writes = config.sync_writes, "database opened");
        Ok(Self {
            store,
            update_lock: Mutex::new(()),
            config,
        })
    }

    /// Open (creating if missing) the database at `path` with default settings
    pub fn open_path<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        Self::open(DatabaseConfig::new(path.as_ref()))
    }

    /// Start a new session with no active transaction
    pub fn session(&self) -> Session<'_> {
        Session::new(self)
    }

    /// Ids of every committed graph, ascending
    pub fn graph_ids(&self) -> StorageResult<Vec<GraphId>> {
        self.store.graph_ids()
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    pub(crate) fn store(&self) -> &RocksDbStore {
        &self.store
    }

    pub(crate) fn update_lock(&self) -> &Mutex<()> {
        &self.update_lock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_missing_without_create_fails() {
        let temp_dir = TempDir::new().unwrap();
        let config = DatabaseConfig {
            create_if_missing: false,
            ..DatabaseConfig::new(temp_dir.path().join("absent"))
        };
        assert!(matches!(Database::open(config), Err(StorageError::RocksDbError(_))));
    }

    #[test]
    fn test_graph_ids_lists_committed_graphs() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open_path(temp_dir.path()).unwrap();
        let mut session = db.session();

        session.begin_update().unwrap();
        let mut first = session.new_graph().unwrap();
        let mut second = session.new_graph().unwrap();
        let a = session.persist(&mut first).unwrap();
        let b = session.persist(&mut second).unwrap();
        assert!(db.graph_ids().unwrap().is_empty());
        session.commit().unwrap();

        assert_ne!(a, b);
        assert_eq!(db.graph_ids().unwrap(), vec![a, b]);
    }
}
