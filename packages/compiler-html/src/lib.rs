//! # Mailframe HTML Compiler
//!
//! Turns a component tree plus [`GlobalSettings`](mailframe_tree::GlobalSettings)
//! into table-based email markup, and assembles new documents from the
//! standard wrapper.
//!
//! Rendering never fails: unknown component types become a visible
//! placeholder and a warning in [`RenderOutput::warnings`].

mod compiler;
mod wrapper;


pub use compiler::{render, CompileError, RenderOptions, RenderOutput, Renderer};
pub use wrapper::{
    add_preview, create_wrapper, insert_content, BODY_ID, CONTENT_ID, HEAD_ID,
    PREVIEW_ID, ROOT_ID,
};
