//! Error types for tree addressing

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("Malformed path '{path}': {reason}")]
    PathSyntax { path: String, reason: String },

    /// A mutation target could not be resolved; the tree is left untouched
    #[error("Path '{path}' is invalid: {reason}")]
    PathInvalid { path: String, reason: String },
}

impl TreeError {
    pub(crate) fn syntax(path: &str, reason: impl Into<String>) -> Self {
        TreeError::PathSyntax {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(path: &str, reason: impl Into<String>) -> Self {
        TreeError::PathInvalid {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

pub type TreeResult<T> = Result<T, TreeError>;
