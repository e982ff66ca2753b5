//! Persistence of user view state
//!
//! Custom positions and the expanded set live in two independent entries of a
//! key-value store, scoped per user. Loading never fails: missing or corrupt
//! entries fall back to empty defaults.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{CanvasSnapshot, DocumentId, ExpandedSet, PositionMap};
use crate::infrastructure::traits::KeyValueStore;

const KEY_PREFIX: &str = "doccanvas";
const POSITIONS_SUFFIX: &str = "node_positions";
const EXPANDED_SUFFIX: &str = "expanded_nodes";

/// Reads and writes a user's [`CanvasSnapshot`].
pub struct PersistenceAdapter {
    store: Arc<dyn KeyValueStore>,
    user: String,
}

impl PersistenceAdapter {
    pub fn new(store: Arc<dyn KeyValueStore>, user: impl Into<String>) -> Self {
        Self {
            store,
            user: user.into(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn positions_key(&self) -> String {
        format!("{KEY_PREFIX}.{}.{POSITIONS_SUFFIX}", self.user)
    }

    pub fn expanded_key(&self) -> String {
        format!("{KEY_PREFIX}.{}.{EXPANDED_SUFFIX}", self.user)
    }

    /// Write both entries. Non-finite positions are dropped: JSON has no
    /// NaN, and one `null` coordinate would void the whole map on load.
    #[instrument(level = "debug", skip_all, fields(user = %self.user))]
    pub fn save(&self, snapshot: &CanvasSnapshot) -> ApplicationResult<()> {
        let positions_key = self.positions_key();
        let finite: PositionMap = snapshot
            .custom_positions
            .iter()
            .filter(|(id, pos)| {
                if !pos.is_finite() {
                    warn!("dropping non-finite position of {}: {}", id, pos);
                }
                pos.is_finite()
            })
            .map(|(id, pos)| (id.clone(), *pos))
            .collect();
        let positions = encode(&positions_key, &finite)?;
        self.store
            .set(&positions_key, &positions)
            .with_key_context(&positions_key)?;

        let expanded_key = self.expanded_key();
        let ids: Vec<&DocumentId> = snapshot.expanded.iter().collect();
        let expanded = encode(&expanded_key, &ids)?;
        self.store
            .set(&expanded_key, &expanded)
            .with_key_context(&expanded_key)?;

        debug!(
            "saved {} positions, {} expanded",
            snapshot.custom_positions.len(),
            snapshot.expanded.len()
        );
        Ok(())
    }

    /// Read both entries; each falls back to empty on any problem.
    #[instrument(level = "debug", skip_all, fields(user = %self.user))]
    pub fn load(&self) -> CanvasSnapshot {
        let custom_positions: PositionMap = self.load_entry(&self.positions_key());
        let expanded: Vec<DocumentId> = self.load_entry(&self.expanded_key());
        CanvasSnapshot::new(custom_positions, expanded.into_iter().collect::<ExpandedSet>())
    }

    /// Remove both entries.
    pub fn clear(&self) -> ApplicationResult<()> {
        let positions_key = self.positions_key();
        self.store
            .remove(&positions_key)
            .with_key_context(&positions_key)?;
        let expanded_key = self.expanded_key();
        self.store
            .remove(&expanded_key)
            .with_key_context(&expanded_key)
    }

    fn load_entry<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(e) => {
                warn!("cannot read {}: {}, using defaults", key, e);
                return T::default();
            }
        };
        match serde_json::from_str::<T>(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("malformed state in {}: {}, using defaults", key, e);
                T::default()
            }
        }
    }
}

fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> ApplicationResult<String> {
    serde_json::to_string(value).map_err(|e| ApplicationError::Persistence {
        key: key.to_string(),
        source: Box::new(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Position;
    use crate::infrastructure::traits::MemoryStore;

    #[test]
    fn given_corrupt_positions_when_loading_then_empty_but_expanded_kept() {
        let store = Arc::new(MemoryStore::new());
        let adapter = PersistenceAdapter::new(store.clone(), "alice");
        store.set(&adapter.positions_key(), "{bad json").unwrap();
        store.set(&adapter.expanded_key(), r#"["1","2"]"#).unwrap();

        let snapshot = adapter.load();

        assert!(snapshot.custom_positions.is_empty());
        assert_eq!(snapshot.expanded.len(), 2);
    }

    #[test]
    fn given_wrong_shape_when_loading_then_defaults() {
        let store = Arc::new(MemoryStore::new());
        let adapter = PersistenceAdapter::new(store.clone(), "alice");
        store.set(&adapter.positions_key(), "[1, 2, 3]").unwrap();
        store.set(&adapter.expanded_key(), r#"{"x": 1}"#).unwrap();

        let snapshot = adapter.load();

        assert_eq!(snapshot, CanvasSnapshot::default());
    }

    #[test]
    fn given_saved_snapshot_when_loading_then_restored() {
        let store = Arc::new(MemoryStore::new());
        let adapter = PersistenceAdapter::new(store, "alice");
        let mut positions = PositionMap::new();
        positions.insert("7".into(), Position::new(1.5, -2.0));
        let snapshot = CanvasSnapshot::new(positions, ["7".into()].into_iter().collect());

        adapter.save(&snapshot).unwrap();

        assert_eq!(adapter.load(), snapshot);
    }
}
