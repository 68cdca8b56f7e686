//! Error types for the editor

use crate::refine::AdapterError;
use crate::storage::PersistenceError;
use mailframe_tree::{PatchError, TreeError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    /// Target path is malformed, unresolvable, or no longer addresses the
    /// node it was computed for. The tree is unchanged.
    #[error("Invalid path '{path}': {reason}")]
    PathInvalid { path: String, reason: String },

    #[error("Validation failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Cannot delete the document root")]
    RootDeleted,

    #[error("Malformed patch: {0}")]
    Patch(#[from] PatchError),

    #[error("Refinement failed: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

impl EditorError {
    /// Whether the same request may succeed if tried again
    pub fn is_retryable(&self) -> bool {
        matches!(self, EditorError::Adapter(_) | EditorError::Persistence(PersistenceError::Io(_)))
    }
}

impl From<TreeError> for EditorError {
    fn from(e: TreeError) -> Self {
        match e {
            TreeError::PathSyntax { path, reason } | TreeError::PathInvalid { path, reason } => {
                EditorError::PathInvalid { path, reason }
            }
        }
    }
}
