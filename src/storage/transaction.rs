/// Transaction implementation
///
/// A `Session` runs one transaction at a time. Update transactions hold the
/// database-wide update lock and stage persisted graph images in a RocksDB
/// WriteBatch that is applied atomically on commit. Read transactions pin a
/// RocksDB snapshot, so they keep seeing the state committed when they began.

use super::{Database, GraphImage};
use crate::error::{GraphError, GraphResult};
use crate::graph::Graph;
use crate::storage::StorageError;
use crate::types::GraphId;
use parking_lot::MutexGuard;
use rocksdb::{Snapshot, WriteBatch};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

const IDLE: u8 = 0;
const READ: u8 = 1;
const UPDATE: u8 = 2;

/// Mode of an active transaction
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TxMode {
    Read,
    Update,
}

/// Transaction state shared between a session and the graphs it hands out
///
/// Graphs check it on every operation: reads need an active transaction,
/// mutations need an update transaction.
#[derive(Debug, Default)]
pub struct TxControl {
    state: AtomicU8,
}

impl TxControl {
    pub fn mode(&self) -> Option<TxMode> {
        match self.state.load(Ordering::Acquire) {
            READ => Some(TxMode::Read),
            UPDATE => Some(TxMode::Update),
            _ => None,
        }
    }

    fn set(&self, mode: Option<TxMode>) {
        let state = match mode {
            None => IDLE,
            Some(TxMode::Read) => READ,
            Some(TxMode::Update) => UPDATE,
        };
        self.state.store(state, Ordering::Release);
    }

    pub fn require_active(&self, operation: &str) -> GraphResult<TxMode> {
        self.mode().ok_or_else(|| {
            GraphError::TransactionState(format!("{} requires an active transaction", operation))
        })
    }

    pub fn require_update(&self, operation: &str) -> GraphResult<()> {
        match self.mode() {
            Some(TxMode::Update) => Ok(()),
            Some(TxMode::Read) => Err(GraphError::TransactionState(format!(
                "{} is not allowed in a read transaction",
                operation
            ))),
            None => Err(GraphError::TransactionState(format!(
                "{} requires an active update transaction",
                operation
            ))),
        }
    }
}

/// A connection to the database that runs transactions one at a time
pub struct Session<'db> {
    db: &'db Database,
    control: Arc<TxControl>,
    update_guard: Option<MutexGuard<'db, ()>>,
    snapshot: Option<Snapshot<'db>>,
    batch: WriteBatch,
    staged: Vec<GraphId>,
}

impl<'db> Session<'db> {
    pub(crate) fn new(db: &'db Database) -> Self {
        Self {
            db,
            control: Arc::new(TxControl::default()),
            update_guard: None,
            snapshot: None,
            batch: WriteBatch::default(),
            staged: Vec::new(),
        }
    }

    /// Mode of the active transaction, `None` when idle
    pub fn mode(&self) -> Option<TxMode> {
        self.control.mode()
    }

    pub fn is_active(&self) -> bool {
        self.mode().is_some()
    }

    /// Begin an update transaction
    ///
    /// # Errors
    /// * `TransactionState` if this session already has an active transaction
    ///   or another session holds the update lock
    pub fn begin_update(&mut self) -> GraphResult<()> {
        self.require_idle()?;
        let guard = self.db.update_lock().try_lock().ok_or_else(|| {
            GraphError::TransactionState("another update transaction is active".to_string())
        })?;

        self.update_guard = Some(guard);
        self.batch = WriteBatch::default();
        self.staged.clear();
        self.control.set(Some(TxMode::Update));
        info!("update transaction started");
        Ok(())
    }

    /// Begin a read transaction
    ///
    /// Reads see the state committed at this point, never later commits.
    pub fn begin_read(&mut self) -> GraphResult<()> {
        self.require_idle()?;
        self.snapshot = Some(self.db.store().snapshot());
        self.control.set(Some(TxMode::Read));
        debug!("read transaction started");
        Ok(())
    }

    /// Commit the active transaction
    ///
    /// For update transactions, every image staged by `persist` becomes
    /// durable in one atomic write. The session is idle afterwards even if
    /// the write fails.
    pub fn commit(&mut self) -> GraphResult<()> {
        match self.control.require_active("commit")? {
            TxMode::Read => {
                self.finish();
                debug!("read transaction committed");
                Ok(())
            }
            TxMode::Update => {
                let batch = std::mem::take(&mut self.batch);
                let staged = std::mem::take(&mut self.staged);
                let result = if staged.is_empty() {
                    Ok(())
                } else {
                    self.db.store().write(batch)
                };
                self.finish();
                result?;
                info!(graphs = staged.len(), "update transaction committed");
                Ok(())
            }
        }
    }

    /// Abandon the active transaction, discarding everything staged
    pub fn abort(&mut self) -> GraphResult<()> {
        let mode = self.control.require_active("abort")?;
        let discarded = self.staged.len();
        self.batch = WriteBatch::default();
        self.staged.clear();
        self.finish();
        info!(?mode, discarded, "transaction aborted");
        Ok(())
    }

    /// Create an empty graph bound to this session
    pub fn new_graph(&self) -> GraphResult<Graph> {
        self.control.require_update("new_graph")?;
        Ok(Graph::new(self.control.clone()))
    }

    /// Build a new, not yet persisted graph from an image
    ///
    /// # Errors
    /// * `Schema` if the image is internally inconsistent
    pub fn restore_graph(&self, image: GraphImage) -> GraphResult<Graph> {
        self.control.require_update("restore_graph")?;
        Graph::from_image(image, self.control.clone(), None)
    }

    /// Stage the full current state of `graph` for commit
    ///
    /// A graph persisted for the first time gets a fresh id; later persists
    /// overwrite the image under the same id. Nothing is durable until
    /// `commit`.
    pub fn persist(&mut self, graph: &mut Graph) -> GraphResult<GraphId> {
        self.control.require_update("persist")?;
        if !graph.is_bound_to(&self.control) {
            return Err(GraphError::TransactionState(
                "graph belongs to a different session".to_string(),
            ));
        }

        let image = graph.to_image()?;
        let id = match graph.id() {
            Some(id) => id,
            None => self.db.store().next_graph_id()?,
        };
        let records = self.db.store().stage_image(&mut self.batch, id, &image)?;
        graph.set_id(id);
        if !self.staged.contains(&id) {
            self.staged.push(id);
        }

        info!(graph = %id, records, "graph staged for commit");
        Ok(id)
    }

    /// Load a persisted graph
    ///
    /// Read transactions see their snapshot; update transactions see the
    /// last committed state, without images staged in this transaction.
    ///
    /// # Errors
    /// * `NotFound` if no graph was committed under `id`
    pub fn open(&self, id: GraphId) -> GraphResult<Graph> {
        self.control.require_active("open")?;
        let image = self
            .db
            .store()
            .load_image(id, self.snapshot.as_ref())?
            .ok_or_else(|| GraphError::NotFound(format!("graph {}", id)))?;
        let records = image.record_count();

        let graph = Graph::from_image(image, self.control.clone(), Some(id)).map_err(|e| match e {
            GraphError::Schema(msg) => GraphError::Storage(StorageError::CorruptRecord(msg)),
            other => other,
        })?;

        debug!(graph = %id, records, "graph opened");
        Ok(graph)
    }

    fn require_idle(&self) -> GraphResult<()> {
        match self.mode() {
            None => Ok(()),
            Some(mode) => Err(GraphError::TransactionState(format!(
                "a {:?} transaction is already active",
                mode
            ))),
        }
    }

    fn finish(&mut self) {
        self.control.set(None);
        self.snapshot = None;
        self.update_guard = None;
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if self.mode() == Some(TxMode::Update) && !self.staged.is_empty() {
            warn!(
                graphs = self.staged.len(),
                "session dropped with an uncommitted update transaction"
            );
        }
        self.finish();
    }
}
