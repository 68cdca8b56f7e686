//! # Mailframe Tree
//!
//! Component-tree engine for Mailframe email documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ tree: model + addressing + mutation algebra │
//! │  - Node / Patch / GlobalSettings            │
//! │  - Path grammar (root.children[0]...)       │
//! │  - find/update/delete/move/duplicate/stats  │
//! │  - Validator against the Registry           │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ compiler-html: tree → email markup          │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: debounced commits, AI patches, save │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Persistent updates**: operations return new trees, inputs are untouched
//! 2. **Ids are stable, paths are positional**
//! 3. **Validate before commit**: a candidate tree only becomes canonical if it validates
//!
//! ## Usage
//!
//! ```rust
//! use mailframe_tree::{operations, path_of, Node, Patch, Registry};
//!
//! let root = Node::new("root", "Container").with_children(vec![
//!     Node::new("s1", "Section").with_children(vec![
//!         Node::new("h1", "Heading").with_content("Hi"),
//!         Node::new("t1", "Text").with_content("body"),
//!     ]),
//! ]);
//!
//! assert_eq!(path_of(&root, "t1").as_deref(), Some("root.children[0].children[1]"));
//!
//! let next = operations::update_by_id(&root, "h1", &Patch::content("Bye"));
//! assert!(mailframe_tree::validate(&next, &Registry::standard()).valid);
//! ```

pub mod error;
pub mod id_generator;
pub mod node;
pub mod operations;
pub mod path;
pub mod registry;
pub mod settings;
pub mod validator;

pub use error::{TreeError, TreeResult};
pub use id_generator::IdGenerator;
pub use node::{Node, Patch, PatchError, Props, STYLE_KEY};
pub use operations::{
    breadcrumbs, delete_by_id, duplicate_component, find_by_id, find_by_path, move_component,
    tree_stats, update_at_path, update_by_id, Direction, TreeStats,
};
pub use path::{path_of, resolve, resolve_for_mutation, Path};
pub use registry::{ComponentKind, ComponentSpec, Registry};
pub use settings::GlobalSettings;
pub use validator::{validate, ValidationReport, Validator};
