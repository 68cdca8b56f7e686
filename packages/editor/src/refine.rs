//! # AI Refinement
//!
//! The refinement collaborator is untrusted, slow and fallible. Its output
//! is treated as raw JSON until [`Patch::from_untrusted`] has shape-checked
//! it, and the patch is applied against the canonical tree as it is *after*
//! the call returns, not as it was when the request was made.
//!
//! ```text
//! snapshot(path) ──▶ adapter.refine (timeout) ──▶ shape check ──▶ apply_patch
//!                                                                   │
//!                         node at path still the snapshot's id? ◀───┘
//! ```

use crate::errors::EditorError;
use crate::pipeline::EditorConfig;
use crate::session::EditSession;
use async_trait::async_trait;
use mailframe_tree::{resolve_for_mutation, update_at_path, validate, Node, Patch, Registry};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    #[error("Refinement timed out after {0:?}")]
    Timeout(Duration),

    #[error("Refinement service failed: {0}")]
    Failed(String),
}

/// External producer of patches for a natural-language instruction
#[async_trait]
pub trait RefineAdapter: Send + Sync {
    /// Suggest a patch (`{ props?, content? }`) for `snapshot`
    async fn refine(&self, snapshot: &Node, prompt: &str) -> Result<Value, AdapterError>;
}

/// Merge `patch` into the node at `path` and validate the result.
///
/// Fails with [`EditorError::PathInvalid`] before cloning anything if the
/// path does not resolve, and with [`EditorError::ValidationFailed`] if the
/// patched tree breaks an invariant. `root` is never modified.
pub fn apply_patch(root: &Node, path: &str, patch: &Patch, registry: &Registry) -> Result<Node, EditorError> {
    let next = update_at_path(root, path, patch)?;

    let report = validate(&next, registry);
    if !report.valid {
        return Err(EditorError::ValidationFailed(report.errors));
    }
    Ok(next)
}

/// What a successful refinement changed
#[derive(Debug, Clone)]
pub struct Refinement {
    pub node_id: String,
    pub patch: Patch,
    pub tree: Arc<Node>,
}

pub struct Refiner {
    adapter: Arc<dyn RefineAdapter>,
    timeout: Duration,
}

impl Refiner {
    pub fn new(adapter: Arc<dyn RefineAdapter>, config: &EditorConfig) -> Self {
        Self {
            adapter,
            timeout: config.refine_timeout(),
        }
    }

    /// Ask the adapter to refine the node at `path` and commit its patch.
    ///
    /// The node's id is recorded when the request is made. If, once the
    /// adapter answers, `path` no longer addresses a node with that id
    /// (deleted, or siblings shifted), the result is discarded with
    /// [`EditorError::PathInvalid`] and canonical is unchanged.
    ///
    /// The adapter sees the display tree, pending edits included. Those edits
    /// were validated when queued and are folded before the patch is applied;
    /// should that fold be rejected anyway, nothing is applied and the fold's
    /// errors come back as [`EditorError::ValidationFailed`].
    #[instrument(skip(self, session, prompt))]
    pub async fn refine_at(&self, session: &EditSession, path: &str, prompt: &str) -> Result<Refinement, EditorError> {
        let snapshot = {
            let display = session.display_tree();
            let (_, node) = resolve_for_mutation(&display, path)?;
            node.clone()
        };
        let expected_id = snapshot.id.clone();
        debug!(node_id = %expected_id, "requesting refinement");

        let raw = tokio::time::timeout(self.timeout, self.adapter.refine(&snapshot, prompt))
            .await
            .map_err(|_| AdapterError::Timeout(self.timeout))??;
        let patch = Patch::from_untrusted(&raw)?;

        let registry = Arc::clone(session.pipeline().registry());
        let result = session.pipeline().commit_direct(|root| {
            let (_, current) = resolve_for_mutation(root, path)?;
            if current.id != expected_id {
                return Err(EditorError::PathInvalid {
                    path: path.to_string(),
                    reason: format!("now addresses '{}' instead of '{}'", current.id, expected_id),
                });
            }
            apply_patch(root, path, &patch, &registry)
        });

        match result {
            Ok(tree) => {
                info!(node_id = %expected_id, "applied refinement");
                Ok(Refinement {
                    node_id: expected_id,
                    patch,
                    tree,
                })
            }
            Err(e) => {
                warn!(node_id = %expected_id, error = %e, "discarded refinement");
                Err(e)
            }
        }
    }
}
