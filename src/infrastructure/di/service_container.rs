//! Service container for dependency injection
//!
//! Wires up the canvas session with its store.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::application::services::{CanvasService, PersistenceAdapter};
use crate::config::Settings;
use crate::domain::DocumentNode;
use crate::infrastructure::traits::{FileStore, KeyValueStore};
use crate::infrastructure::{InfraError, InfraResult};

/// Container holding settings and the I/O boundary implementations.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Durable view-state store
    pub store: Arc<dyn KeyValueStore>,
}

impl ServiceContainer {
    /// Create a new service container with a file store under `state_dir`.
    pub fn new(settings: Settings) -> Self {
        let store = Arc::new(FileStore::new(settings.state_dir.clone()));
        Self::with_deps(settings, store)
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, store: Arc<dyn KeyValueStore>) -> Self {
        let settings = Arc::new(settings);

        Self { settings, store }
    }

    /// Persistence scoped to the configured user.
    pub fn persistence(&self) -> PersistenceAdapter {
        PersistenceAdapter::new(self.store.clone(), self.settings.user.clone())
    }

    /// A fresh canvas session for the configured user.
    pub fn canvas(&self) -> CanvasService {
        CanvasService::new(&self.settings, self.persistence())
    }

    /// A canvas session loaded with the documents of a JSON file.
    pub fn canvas_from_file(&self, documents: &Path) -> InfraResult<CanvasService> {
        let documents = read_documents(documents)?;
        let mut canvas = self.canvas();
        canvas.set_documents(documents);
        Ok(canvas)
    }
}

/// Read a JSON array of document records.
pub fn read_documents(path: &Path) -> InfraResult<Vec<DocumentNode>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| InfraError::io(format!("read documents {}", path.display()), e))?;
    let documents: Vec<DocumentNode> = serde_json::from_str(&content)
        .map_err(|e| InfraError::json(format!("parse documents {}", path.display()), e))?;
    debug!("read {} documents from {}", documents.len(), path.display());
    Ok(documents)
}
