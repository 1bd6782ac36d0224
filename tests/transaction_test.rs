/// Transaction integration tests
///
/// Session lifecycle, isolation between sessions and the single-writer rule

use rust_property_graph::{Database, GraphError, IndexKind, TxMode, Value, ValueKind};
use std::thread;
use tempfile::TempDir;

fn is_tx_error<T>(result: Result<T, GraphError>) -> bool {
    matches!(result, Err(GraphError::TransactionState(_)))
}

#[test]
fn test_operations_require_transaction() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::open_path(temp_dir.path()).unwrap();
    let mut session = db.session();

    assert_eq!(session.mode(), None);
    assert!(is_tx_error(session.new_graph()));
    assert!(is_tx_error(session.commit()));
    assert!(is_tx_error(session.abort()));

    session.begin_update().unwrap();
    let mut g = session.new_graph().unwrap();
    let person = g.define_node_type("PERSON").unwrap();
    let node = g.new_node(person).unwrap();
    session.commit().unwrap();

    // The graph outlives the transaction but is unusable until rebound
    assert!(is_tx_error(g.new_node(person)));
    assert!(is_tx_error(g.find_node_type("PERSON")));
    assert!(is_tx_error(g.element_type(node)));
    assert!(is_tx_error(session.persist(&mut g)));
}

#[test]
fn test_read_transaction_rejects_writes() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::open_path(temp_dir.path()).unwrap();
    let mut session = db.session();

    session.begin_update().unwrap();
    let mut g = session.new_graph().unwrap();
    let person = g.define_node_type("PERSON").unwrap();
    let name = g
        .define_property(person, "NAME", ValueKind::Text, IndexKind::Unique)
        .unwrap();
    let alice = g.new_node(person).unwrap();
    g.set_property(alice, name, "Alice").unwrap();
    let id = session.persist(&mut g).unwrap();
    session.commit().unwrap();

    session.begin_read().unwrap();
    assert_eq!(session.mode(), Some(TxMode::Read));
    let mut g = session.open(id).unwrap();
    assert_eq!(g.find_by_unique(name, "Alice").unwrap(), Some(alice));
    assert!(is_tx_error(g.new_node(person)));
    assert!(is_tx_error(g.set_property(alice, name, "Alicia")));
    assert!(is_tx_error(g.define_node_type("MOVIE")));
    assert!(is_tx_error(session.new_graph()));
    assert!(is_tx_error(session.persist(&mut g)));
    assert_eq!(
        g.get_property(alice, name).unwrap(),
        Some(&Value::from("Alice"))
    );
    session.commit().unwrap();
}

#[test]
fn test_begin_twice_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::open_path(temp_dir.path()).unwrap();
    let mut session = db.session();

    session.begin_read().unwrap();
    assert!(is_tx_error(session.begin_update()));
    assert!(is_tx_error(session.begin_read()));
    session.abort().unwrap();

    session.begin_update().unwrap();
    assert!(is_tx_error(session.begin_read()));
    session.abort().unwrap();
    assert_eq!(session.mode(), None);
}

#[test]
fn test_abort_discards_staged_graph() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::open_path(temp_dir.path()).unwrap();
    let mut session = db.session();

    session.begin_update().unwrap();
    let mut g = session.new_graph().unwrap();
    g.define_node_type("PERSON").unwrap();
    let id = session.persist(&mut g).unwrap();
    session.abort().unwrap();

    assert!(db.graph_ids().unwrap().is_empty());
    session.begin_read().unwrap();
    assert!(matches!(session.open(id), Err(GraphError::NotFound(_))));
}

#[test]
fn test_aborted_update_keeps_previous_version() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::open_path(temp_dir.path()).unwrap();
    let mut session = db.session();

    session.begin_update().unwrap();
    let mut g = session.new_graph().unwrap();
    let person = g.define_node_type("PERSON").unwrap();
    g.new_node(person).unwrap();
    let id = session.persist(&mut g).unwrap();
    session.commit().unwrap();

    session.begin_update().unwrap();
    let mut g = session.open(id).unwrap();
    g.new_node(person).unwrap();
    g.new_node(person).unwrap();
    session.persist(&mut g).unwrap();
    session.abort().unwrap();

    session.begin_read().unwrap();
    assert_eq!(session.open(id).unwrap().node_count().unwrap(), 1);
}

/// A read transaction keeps seeing the state from when it began
#[test]
fn test_read_snapshot_isolation() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::open_path(temp_dir.path()).unwrap();

    let mut writer = db.session();
    writer.begin_update().unwrap();
    let mut g = writer.new_graph().unwrap();
    let person = g.define_node_type("PERSON").unwrap();
    g.new_node(person).unwrap();
    let id = writer.persist(&mut g).unwrap();
    writer.commit().unwrap();

    let mut reader = db.session();
    reader.begin_read().unwrap();

    writer.begin_update().unwrap();
    let mut g = writer.open(id).unwrap();
    g.new_node(person).unwrap();
    writer.persist(&mut g).unwrap();
    let mut other = writer.new_graph().unwrap();
    let other_id = writer.persist(&mut other).unwrap();
    writer.commit().unwrap();

    assert_eq!(reader.open(id).unwrap().node_count().unwrap(), 1);
    assert!(matches!(reader.open(other_id), Err(GraphError::NotFound(_))));
    reader.commit().unwrap();

    reader.begin_read().unwrap();
    assert_eq!(reader.open(id).unwrap().node_count().unwrap(), 2);
    assert!(reader.open(other_id).is_ok());
}

#[test]
fn test_uncommitted_update_invisible_to_readers() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::open_path(temp_dir.path()).unwrap();

    let mut writer = db.session();
    writer.begin_update().unwrap();
    let mut g = writer.new_graph().unwrap();
    let id = writer.persist(&mut g).unwrap();

    let mut reader = db.session();
    reader.begin_read().unwrap();
    assert!(matches!(reader.open(id), Err(GraphError::NotFound(_))));
    reader.commit().unwrap();

    writer.commit().unwrap();
    reader.begin_read().unwrap();
    assert!(reader.open(id).is_ok());
}

#[test]
fn test_single_update_transaction() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::open_path(temp_dir.path()).unwrap();

    let mut first = db.session();
    let mut second = db.session();
    first.begin_update().unwrap();
    assert!(is_tx_error(second.begin_update()));
    // Readers are never blocked by the writer
    second.begin_read().unwrap();
    second.commit().unwrap();

    first.commit().unwrap();
    second.begin_update().unwrap();
    assert!(is_tx_error(first.begin_update()));
    second.abort().unwrap();
    first.begin_update().unwrap();
}

/// The writer slot is process-wide, not per-thread
#[test]
fn test_update_exclusive_across_threads() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::open_path(temp_dir.path()).unwrap();

    let mut holder = db.session();
    holder.begin_update().unwrap();

    thread::scope(|scope| {
        let contender = scope.spawn(|| {
            let mut session = db.session();
            is_tx_error(session.begin_update())
        });
        assert!(contender.join().unwrap());
    });

    holder.commit().unwrap();

    let id = thread::scope(|scope| {
        scope
            .spawn(|| {
                let mut session = db.session();
                session.begin_update().unwrap();
                let mut g = session.new_graph().unwrap();
                let id = session.persist(&mut g).unwrap();
                session.commit().unwrap();
                id
            })
            .join()
            .unwrap()
    });

    assert_eq!(db.graph_ids().unwrap(), vec![id]);
}

#[test]
fn test_dropping_session_releases_writer() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::open_path(temp_dir.path()).unwrap();

    {
        let mut session = db.session();
        session.begin_update().unwrap();
        let mut g = session.new_graph().unwrap();
        session.persist(&mut g).unwrap();
    }

    assert!(db.graph_ids().unwrap().is_empty());
    let mut session = db.session();
    session.begin_update().unwrap();
}

#[test]
fn test_graph_from_other_session_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::open_path(temp_dir.path()).unwrap();

    let mut first = db.session();
    first.begin_update().unwrap();
    let mut g = first.new_graph().unwrap();
    first.commit().unwrap();

    let mut second = db.session();
    second.begin_update().unwrap();
    assert!(is_tx_error(second.persist(&mut g)));
}
