//! # Edit Session
//!
//! One user's editing view of a document: UI edits go through the debounced
//! pipeline, structural edits commit directly, and saving always flushes
//! before anything is read for persistence.

use crate::errors::EditorError;
use crate::pipeline::{CommitPipeline, EditorConfig, FoldOutcome, PipelineState};
use crate::storage::{Persistence, StoredId};
use mailframe_compiler_html::{RenderOptions, RenderOutput, Renderer};
use mailframe_tree::{
    delete_by_id, duplicate_component, find_by_id, move_component, Direction, GlobalSettings,
    IdGenerator, Node, Patch, Props, Registry,
};
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::{info, instrument, warn};

/// Result of [`EditSession::save`]
#[derive(Debug, Clone)]
pub struct SaveReport {
    pub stored_id: StoredId,
    /// Canonical version that was stored
    pub version: u64,
    /// What the flush before the save did
    pub flushed: FoldOutcome,
}

pub struct EditSession {
    /// Unique session identifier
    pub id: String,
    pipeline: CommitPipeline,
    settings: GlobalSettings,
    ids: Mutex<IdGenerator>,
    store: Arc<dyn Persistence>,
    /// Canonical version and rejected-fold count as of the last save
    saved: Mutex<(u64, u64)>,
}

impl EditSession {
    /// Open a session on a tree that is already persisted as-is
    pub fn new(
        id: impl Into<String>,
        root: Node,
        settings: GlobalSettings,
        registry: Arc<Registry>,
        store: Arc<dyn Persistence>,
        config: &EditorConfig,
    ) -> Self {
        let id = id.into();
        let ids = IdGenerator::new(&format!("{}:{}", id, root.id));
        Self {
            pipeline: CommitPipeline::new(root, registry, config),
            id,
            settings,
            ids: Mutex::new(ids),
            store,
            saved: Mutex::new((0, 0)),
        }
    }

    pub fn pipeline(&self) -> &CommitPipeline {
        &self.pipeline
    }

    pub fn settings(&self) -> &GlobalSettings {
        &self.settings
    }

    /// What the user sees: canonical plus pending edits
    pub fn display_tree(&self) -> Arc<Node> {
        self.pipeline.display_tree()
    }

    /// Queue a patch for `node_id` through the debounce window.
    ///
    /// A patch that would leave the document invalid is refused with
    /// [`EditorError::ValidationFailed`] and never shows in the display tree.
    pub fn commit(&self, node_id: &str, patch: Patch, description: impl Into<String>) -> Result<(), EditorError> {
        self.pipeline.commit_edit(node_id, patch, description)
    }

    pub fn edit_content(&self, node_id: &str, content: impl Into<String>) -> Result<(), EditorError> {
        self.commit(node_id, Patch::content(content), "edit content")
    }

    pub fn edit_style(&self, node_id: &str, key: &str, value: impl Into<Value>) -> Result<(), EditorError> {
        self.commit(node_id, Patch::style(key, value), format!("set style {}", key))
    }

    pub fn edit_props(&self, node_id: &str, props: Props) -> Result<(), EditorError> {
        let keys = props.keys().cloned().collect::<Vec<_>>().join(", ");
        self.commit(node_id, Patch::props(props), format!("set props {}", keys))
    }

    /// Remove `node_id` and its subtree. The root cannot be deleted.
    pub fn delete(&self, node_id: &str) -> Result<Arc<Node>, EditorError> {
        self.pipeline.commit_direct(|root| {
            require(root, node_id)?;
            delete_by_id(root, node_id).ok_or(EditorError::RootDeleted)
        })
    }

    pub fn move_node(&self, node_id: &str, direction: Direction) -> Result<Arc<Node>, EditorError> {
        self.pipeline.commit_direct(|root| {
            require(root, node_id)?;
            Ok(move_component(root, node_id, direction))
        })
    }

    pub fn duplicate(&self, node_id: &str) -> Result<Arc<Node>, EditorError> {
        self.pipeline.commit_direct(|root| {
            require(root, node_id)?;
            let mut ids = self.ids.lock().unwrap_or_else(PoisonError::into_inner);
            Ok(duplicate_component(root, node_id, &mut ids))
        })
    }

    /// Flush, persist canonical, and mark that version as saved.
    ///
    /// Nothing is stored if the flush drops pending edits.
    #[instrument(skip(self), fields(session = %self.id))]
    pub async fn save(&self) -> Result<SaveReport, EditorError> {
        let snapshot = self.pipeline.snapshot_for_save();
        if let FoldOutcome::Rejected { errors } = &snapshot.flushed {
            warn!(errors = errors.len(), "pending edits rejected, not saving");
            return Err(EditorError::ValidationFailed(errors.clone()));
        }
        let stored_id = self.store.store(&snapshot.tree, &self.settings).await?;

        *self.saved.lock().unwrap_or_else(PoisonError::into_inner) =
            (snapshot.version, self.pipeline.rejected_folds());
        info!(stored_id = %stored_id, version = snapshot.version, "session saved");

        Ok(SaveReport {
            stored_id,
            version: snapshot.version,
            flushed: snapshot.flushed,
        })
    }

    /// Unsaved work exists: pending edits, canonical changes since the last
    /// save, or edits dropped by a rejected fold since the last save
    pub fn is_dirty(&self) -> bool {
        let (version, rejected) = *self.saved.lock().unwrap_or_else(PoisonError::into_inner);
        self.pipeline.pending_count() > 0
            || self.pipeline.version() != version
            || self.pipeline.rejected_folds() != rejected
    }

    /// Drop pending edits. Returns how many were dropped.
    pub fn discard(&self) -> usize {
        self.pipeline.discard()
    }

    pub fn state(&self) -> PipelineState {
        self.pipeline.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.pipeline.subscribe()
    }

    /// Render what the user currently sees
    pub fn render_preview(&self, options: &RenderOptions) -> RenderOutput {
        Renderer::new(self.pipeline.registry()).render(&self.display_tree(), &self.settings, options)
    }
}

fn require(root: &Node, node_id: &str) -> Result<(), EditorError> {
    match find_by_id(root, node_id) {
        Some(_) => Ok(()),
        None => Err(EditorError::NodeNotFound(node_id.to_string())),
    }
}
