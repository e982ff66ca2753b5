//! Tests for PersistenceAdapter over the file-backed store

use std::fs;
use std::sync::Arc;

use rstest::rstest;
use tempfile::TempDir;

use doccanvas::application::services::PersistenceAdapter;
use doccanvas::domain::{CanvasSnapshot, DocumentId, ExpandedSet, Position, PositionMap};
use doccanvas::infrastructure::traits::{FileStore, KeyValueStore};

fn snapshot() -> CanvasSnapshot {
    let mut positions = PositionMap::new();
    positions.insert(DocumentId::from("1"), Position::new(10.0, 20.0));
    positions.insert(DocumentId::from("2"), Position::new(-5.5, 180.0));
    let expanded: ExpandedSet = [DocumentId::from("1")].into_iter().collect();
    CanvasSnapshot::new(positions, expanded)
}

#[test]
fn given_saved_snapshot_when_loading_from_new_adapter_then_restored() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(temp.path()));
    PersistenceAdapter::new(store.clone(), "alice")
        .save(&snapshot())
        .unwrap();

    // Act
    let loaded = PersistenceAdapter::new(store, "alice").load();

    // Assert
    assert_eq!(loaded, snapshot());
}

#[test]
fn given_two_users_when_saving_then_state_isolated() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(temp.path()));
    let alice = PersistenceAdapter::new(store.clone(), "alice");
    let bob = PersistenceAdapter::new(store, "bob");

    // Act
    alice.save(&snapshot()).unwrap();

    // Assert
    assert_eq!(alice.load(), snapshot());
    assert_eq!(bob.load(), CanvasSnapshot::default());
    assert_ne!(alice.positions_key(), bob.positions_key());
}

#[test]
fn given_corrupt_positions_file_when_loading_then_empty_positions() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(temp.path()));
    let adapter = PersistenceAdapter::new(store.clone(), "alice");
    adapter.save(&snapshot()).unwrap();
    fs::write(store.path_for(&adapter.positions_key()), "{bad json").unwrap();

    // Act
    let loaded = adapter.load();

    // Assert
    assert!(loaded.custom_positions.is_empty());
    assert_eq!(loaded.expanded, snapshot().expanded);
}

#[test]
fn given_missing_state_dir_when_loading_then_defaults() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(temp.path().join("does/not/exist")));

    let loaded = PersistenceAdapter::new(store, "alice").load();

    assert_eq!(loaded, CanvasSnapshot::default());
}

#[test]
fn given_missing_state_dir_when_saving_then_created() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("nested/state");
    let store = Arc::new(FileStore::new(&dir));

    // Act
    PersistenceAdapter::new(store, "alice")
        .save(&snapshot())
        .unwrap();

    // Assert
    assert!(dir.join("doccanvas.alice.node_positions.json").exists());
    assert!(dir.join("doccanvas.alice.expanded_nodes.json").exists());
}

#[test]
fn given_saved_state_when_clearing_then_entries_removed() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(temp.path()));
    let adapter = PersistenceAdapter::new(store.clone(), "alice");
    adapter.save(&snapshot()).unwrap();

    // Act
    adapter.clear().unwrap();
    adapter.clear().unwrap();

    // Assert
    assert_eq!(adapter.load(), CanvasSnapshot::default());
    assert!(store.get(&adapter.expanded_key()).unwrap().is_none());
}

#[test]
fn given_saved_positions_when_reading_raw_then_keyed_json_object() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(temp.path()));
    let adapter = PersistenceAdapter::new(store.clone(), "alice");

    // Act
    adapter.save(&snapshot()).unwrap();

    // Assert
    let raw = store.get(&adapter.positions_key()).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["1"]["x"], 10.0);
    assert_eq!(value["1"]["y"], 20.0);
    let raw = store.get(&adapter.expanded_key()).unwrap().unwrap();
    assert_eq!(raw, r#"["1"]"#);
}

#[test]
fn given_odd_user_name_when_storing_then_file_name_escaped() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::new(temp.path());

    let path = store.path_for("doccanvas.a/b c.node_positions");

    assert_eq!(
        path,
        temp.path().join("doccanvas.a%2Fb%20c.node_positions.json")
    );
}

#[rstest]
#[case("a/b", "a_b")]
#[case("a b", "a_b")]
#[case("a/b", "a%2Fb")]
#[case("a\\b", "a/b")]
fn given_similar_user_names_when_saving_then_state_isolated(#[case] first: &str, #[case] second: &str) {
    // Arrange
    let temp = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(temp.path()));
    let one = PersistenceAdapter::new(store.clone(), first);
    let two = PersistenceAdapter::new(store, second);

    // Act
    one.save(&snapshot()).unwrap();

    // Assert
    assert_eq!(one.load(), snapshot());
    assert_eq!(two.load(), CanvasSnapshot::default());
}

#[test]
fn given_non_finite_position_when_saving_then_other_positions_reload() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(temp.path()));
    let adapter = PersistenceAdapter::new(store, "alice");
    let mut positions = PositionMap::new();
    positions.insert(DocumentId::from("1"), Position::new(10.0, 20.0));
    positions.insert(DocumentId::from("2"), Position::new(f64::NAN, 5.0));
    let expanded = ExpandedSet::new();

    // Act
    adapter
        .save(&CanvasSnapshot::new(positions, expanded))
        .unwrap();

    // Assert
    let loaded = adapter.load();
    assert_eq!(loaded.custom_positions.len(), 1);
    assert_eq!(
        loaded.custom_positions.get(&DocumentId::from("1")),
        Some(&Position::new(10.0, 20.0))
    );
}
