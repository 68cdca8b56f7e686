//! # Persistence Boundary
//!
//! Saving is an external concern. The editor only needs something that can
//! take a canonical tree plus settings and hand back an identifier.
//!
//! - [`MemoryStore`]: keeps every stored revision in memory (tests, previews)
//! - [`FileStore`]: one JSON document on disk (`{ "root": ..., "settings": ... }`)

use async_trait::async_trait;
use mailframe_tree::{GlobalSettings, Node};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store rejected the document: {0}")]
    Rejected(String),
}

/// Identifier handed back by a store for one saved revision
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoredId(pub String);

impl fmt::Display for StoredId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// On-disk document format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub root: Node,
    #[serde(default)]
    pub settings: GlobalSettings,
}

#[async_trait]
pub trait Persistence: Send + Sync {
    async fn store(&self, root: &Node, settings: &GlobalSettings) -> Result<StoredId, PersistenceError>;
}

/// In-memory store that records every revision it is given
#[derive(Debug, Default)]
pub struct MemoryStore {
    revisions: Mutex<Vec<StoredDocument>>,
    reject_with: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored revision, oldest first
    pub fn revisions(&self) -> Vec<StoredDocument> {
        self.revisions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<StoredDocument> {
        self.revisions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    /// Make every following `store` call fail with `reason`
    pub fn reject_with(&self, reason: impl Into<String>) {
        *self.reject_with.lock().unwrap_or_else(PoisonError::into_inner) = Some(reason.into());
    }
}

#[async_trait]
impl Persistence for MemoryStore {
    async fn store(&self, root: &Node, settings: &GlobalSettings) -> Result<StoredId, PersistenceError> {
        if let Some(reason) = self
            .reject_with
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Err(PersistenceError::Rejected(reason));
        }

        let mut revisions = self.revisions.lock().unwrap_or_else(PoisonError::into_inner);
        revisions.push(StoredDocument {
            root: root.clone(),
            settings: settings.clone(),
        });
        let id = StoredId(format!("memory-{}", revisions.len()));
        debug!(stored_id = %id, "stored document in memory");
        Ok(id)
    }
}

/// Stores the document as pretty JSON at a fixed path
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document currently on disk
    pub async fn load(&self) -> Result<StoredDocument, PersistenceError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[async_trait]
impl Persistence for FileStore {
    async fn store(&self, root: &Node, settings: &GlobalSettings) -> Result<StoredId, PersistenceError> {
        let document = StoredDocument {
            root: root.clone(),
            settings: settings.clone(),
        };
        let json = serde_json::to_string_pretty(&document)?;

        // Write next to the target and rename so a crash never leaves half a document
        let tmp = self.path.with_extension("json.tmp");
        if let Err(e) = write_then_rename(&tmp, &self.path, json.as_bytes()).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                debug!(path = %tmp.display(), error = %cleanup, "temp file not removed");
            }
            return Err(e.into());
        }

        let id = StoredId(format!(
            "{}#{:08x}",
            self.path.display(),
            crc32fast::hash(json.as_bytes())
        ));
        info!(path = %self.path.display(), bytes = json.len(), "saved document");
        Ok(id)
    }
}

async fn write_then_rename(tmp: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(tmp, bytes).await?;
    tokio::fs::rename(tmp, target).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Node {
        Node::new("root", "Container").with_children(vec![Node::new("t", "Text").with_content("hi")])
    }

    #[tokio::test]
    async fn test_memory_store_records_revisions() {
        let store = MemoryStore::new();
        let settings = GlobalSettings::default();

        let first = store.store(&doc(), &settings).await.unwrap();
        let second = store.store(&Node::new("root", "Container"), &settings).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(store.revisions().len(), 2);
        assert_eq!(store.last().unwrap().root, Node::new("root", "Container"));
    }

    #[tokio::test]
    async fn test_memory_store_rejection() {
        let store = MemoryStore::new();
        store.reject_with("quota exceeded");

        let err = store.store(&doc(), &GlobalSettings::default()).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Rejected(ref r) if r == "quota exceeded"));
        assert!(store.revisions().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("email.json"));
        let settings = GlobalSettings {
            max_width: 480,
            ..Default::default()
        };

        store.store(&doc(), &settings).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded.root, doc());
        assert_eq!(loaded.settings.max_width, 480);
        assert!(!dir.path().join("email.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("email.json");
        // a directory in the way makes the rename fail
        std::fs::create_dir(&target).unwrap();

        let store = FileStore::new(&target);
        let err = store.store(&doc(), &GlobalSettings::default()).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Io(_)));
        assert!(!dir.path().join("email.json.tmp").exists());
    }

    #[test]
    fn test_document_without_settings_uses_defaults() {
        let json = r#"{ "root": { "id": "root", "componentType": "Container" } }"#;
        let document: StoredDocument = serde_json::from_str(json).unwrap();
        assert_eq!(document.settings, GlobalSettings::default());
    }
}
