//! Document store backends.
//!
//! The editor only ever replaces a whole document: the write body is
//! `{"presentation": <Presentation>}` keyed by document id, with no partial
//! updates. Any backend that can fetch and replace a JSON blob by id fits.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::PersistConfig;
use crate::ids::DocumentId;
use crate::presentation::Presentation;

/// Whole-document replace body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentPatch {
    pub presentation: Arc<Presentation>,
}

/// Remote (or local) storage for presentation documents
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Load a document by id
    async fn fetch(&self, id: DocumentId) -> Result<Presentation>;

    /// Replace a document by id
    async fn patch(&self, id: DocumentId, body: &DocumentPatch) -> Result<()>;
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for Arc<S> {
    async fn fetch(&self, id: DocumentId) -> Result<Presentation> {
        (**self).fetch(id).await
    }

    async fn patch(&self, id: DocumentId, body: &DocumentPatch) -> Result<()> {
        (**self).patch(id, body).await
    }
}

/// In-process store that also keeps a log of every write
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    documents: HashMap<DocumentId, Arc<Presentation>>,
    writes: Vec<(DocumentId, Arc<Presentation>)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document without recording a write
    pub fn insert(&self, id: DocumentId, presentation: Presentation) {
        self.inner.lock().documents.insert(id, Arc::new(presentation));
    }

    /// Current stored value of a document
    pub fn get(&self, id: DocumentId) -> Option<Arc<Presentation>> {
        self.inner.lock().documents.get(&id).cloned()
    }

    /// Every write received, in arrival order
    pub fn writes(&self) -> Vec<(DocumentId, Arc<Presentation>)> {
        self.inner.lock().writes.clone()
    }

    pub fn write_count(&self) -> usize {
        self.inner.lock().writes.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch(&self, id: DocumentId) -> Result<Presentation> {
        self.get(id)
            .map(|doc| doc.as_ref().clone())
            .ok_or_else(|| anyhow!("Document {} not found", id))
    }

    async fn patch(&self, id: DocumentId, body: &DocumentPatch) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.documents.insert(id, Arc::clone(&body.presentation));
        inner.writes.push((id, Arc::clone(&body.presentation)));
        Ok(())
    }
}

/// One JSON file per document in a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the configured storage directory
    pub fn from_config(config: &PersistConfig) -> Self {
        Self::new(config.storage_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path where a document is persisted
    pub fn path_for(&self, id: DocumentId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn fetch(&self, id: DocumentId) -> Result<Presentation> {
        let path = self.path_for(id);
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read from {:?}", path))?;
        let body: DocumentPatch = serde_json::from_slice(&bytes)
            .with_context(|| format!("Invalid document in {:?}", path))?;
        Ok(Arc::unwrap_or_clone(body.presentation))
    }

    async fn patch(&self, id: DocumentId, body: &DocumentPatch) -> Result<()> {
        // Ensure directory exists
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create {:?}", self.dir))?;

        let path = self.path_for(id);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(body)?;

        // Write then rename so readers never see a partial document
        tokio::fs::write(&tmp, bytes)
            .await
            .with_context(|| format!("Failed to save to {:?}", tmp))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("Failed to move {:?} into place", tmp))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdGenerator;

    fn doc(title: &str) -> Presentation {
        let mut doc = Presentation::blank(&mut IdGenerator::with_namespace("store"));
        doc.title = title.to_string();
        doc
    }

    #[tokio::test]
    async fn memory_store_logs_writes() {
        let store = MemoryStore::new();
        let id = DocumentId::new();
        assert!(store.fetch(id).await.is_err());

        store.insert(id, doc("seed"));
        assert_eq!(store.fetch(id).await.unwrap().title, "seed");
        assert_eq!(store.write_count(), 0);

        let body = DocumentPatch {
            presentation: Arc::new(doc("v2")),
        };
        store.patch(id, &body).await.unwrap();
        assert_eq!(store.fetch(id).await.unwrap().title, "v2");
        assert_eq!(store.writes()[0].0, id);
    }

    #[tokio::test]
    async fn file_store_round_trips_documents() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));
        let id = DocumentId::new();

        assert!(store.fetch(id).await.is_err());

        let body = DocumentPatch {
            presentation: Arc::new(doc("Q3 pitch")),
        };
        store.patch(id, &body).await.unwrap();
        assert_eq!(store.fetch(id).await.unwrap(), *body.presentation);

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path_for(id)).unwrap()).unwrap();
        assert_eq!(raw["presentation"]["title"], "Q3 pitch");
        assert!(!store.path_for(id).with_extension("json.tmp").exists());
    }

    #[test]
    fn file_store_uses_configured_dir() {
        let config = PersistConfig {
            storage_dir: Some(PathBuf::from("/srv/decks")),
            ..PersistConfig::default()
        };
        let store = FileStore::from_config(&config);
        let id = DocumentId::new();
        assert_eq!(store.path_for(id), Path::new("/srv/decks").join(format!("{}.json", id)));
    }

    #[tokio::test]
    async fn file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let id = DocumentId::new();
        std::fs::write(store.path_for(id), "not json").unwrap();

        let err = store.fetch(id).await.unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid document"));
    }
}
