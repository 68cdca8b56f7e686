//! # Mailframe Editor
//!
//! Editing engine for Mailframe documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ UI edits (content/style/props)              │
//! └─────────────────────────────────────────────┘
//!                     ↓ commit_edit
//! ┌─────────────────────────────────────────────┐
//! │ CommitPipeline                              │
//! │  - overlay of pending edits (display only)  │
//! │  - debounce timer → fold → validate         │
//! │  - flush / discard / snapshot_for_save      │
//! └─────────────────────────────────────────────┘
//!          ↑ commit_direct              ↓ save
//! ┌──────────────────────────┐  ┌───────────────┐
//! │ structural edits, AI     │  │ Persistence   │
//! │ patches (Refiner)        │  │ Memory / File │
//! └──────────────────────────┘  └───────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Canonical is always valid**: every candidate is validated before it is swapped in
//! 2. **No lost edits**: invalid edits are refused when made, and saving flushes the overlay before reading canonical
//! 3. **Stale AI output is expected**: a patch whose target moved is discarded, not forced
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mailframe_editor::{EditSession, EditorConfig, MemoryStore};
//! use mailframe_tree::{GlobalSettings, Node, Registry};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), mailframe_editor::EditorError> {
//! let root = Node::new("root", "Container")
//!     .with_children(vec![Node::new("t1", "Text").with_content("Hello")]);
//!
//! let session = EditSession::new(
//!     "client-1",
//!     root,
//!     GlobalSettings::default(),
//!     Arc::new(Registry::standard()),
//!     Arc::new(MemoryStore::new()),
//!     &EditorConfig::default(),
//! );
//!
//! session.edit_content("t1", "Hello, world")?;
//! session.save().await?;
//! # Ok(())
//! # }
//! ```

mod errors;
mod pipeline;
mod refine;
mod session;
mod storage;

pub use errors::EditorError;
pub use pipeline::{
    CommitPipeline, EditorConfig, FoldOutcome, OverlayEntry, PipelineState, SaveSnapshot,
};
pub use refine::{apply_patch, AdapterError, RefineAdapter, Refinement, Refiner};
pub use session::{EditSession, SaveReport};
pub use storage::{FileStore, MemoryStore, Persistence, PersistenceError, StoredDocument, StoredId};
