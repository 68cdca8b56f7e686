//! # Document Wrapper
//!
//! Builds the canonical email skeleton that content is spliced into:
//!
//! ```text
//! Email        (email-root)
//! ├── Head     (email-head)      ← preview slot
//! └── Body     (email-body)
//!     └── Container (email-content)  ← content slot
//! ```

use crate::compiler::CompileError;
use mailframe_tree::{ComponentKind, GlobalSettings, Node, STYLE_KEY};
use serde_json::json;

pub const ROOT_ID: &str = "email-root";
pub const HEAD_ID: &str = "email-head";
pub const BODY_ID: &str = "email-body";
pub const CONTENT_ID: &str = "email-content";
pub const PREVIEW_ID: &str = "email-preview";

/// Build the wrapper skeleton parameterized by `settings`
pub fn create_wrapper(settings: &GlobalSettings) -> Node {
    let body = Node::new(BODY_ID, ComponentKind::Body.name())
        .with_style("backgroundColor", settings.background_color.clone())
        .with_style("fontFamily", settings.font_family.clone())
        .with_children(vec![Node::new(CONTENT_ID, ComponentKind::Container.name())
            .with_style("maxWidth", json!(settings.max_width))
            .with_children(Vec::new())]);

    Node::new(ROOT_ID, ComponentKind::Email.name())
        .with_prop("lang", "en")
        .with_children(vec![
            Node::new(HEAD_ID, ComponentKind::Head.name()).with_children(Vec::new()),
            body,
        ])
}

/// Append `content` in order to the wrapper's content container
pub fn insert_content(wrapper: &Node, content: Vec<Node>) -> Result<Node, CompileError> {
    let mut next = wrapper.clone();
    let slot = find_mut(&mut next, CONTENT_ID).ok_or(CompileError::MissingSlot("content"))?;
    slot.children_mut().extend(content);
    Ok(next)
}

/// Put a hidden preview line first in the head slot, replacing any existing one
pub fn add_preview(tree: &Node, preview_text: &str) -> Result<Node, CompileError> {
    let mut next = tree.clone();
    let head = find_mut(&mut next, HEAD_ID).ok_or(CompileError::MissingSlot("head"))?;

    let children = head.children_mut();
    children.retain(|child| child.component_type != ComponentKind::Preview.name());
    children.insert(
        0,
        Node::new(PREVIEW_ID, ComponentKind::Preview.name()).with_content(preview_text),
    );
    Ok(next)
}

fn find_mut<'a>(node: &'a mut Node, id: &str) -> Option<&'a mut Node> {
    if node.id == id {
        return Some(node);
    }
    node.children
        .as_mut()?
        .iter_mut()
        .find_map(|child| find_mut(child, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailframe_tree::{validate, Registry};

    #[test]
    fn test_wrapper_is_valid_and_uses_settings() {
        let settings = GlobalSettings {
            max_width: 640,
            ..Default::default()
        };
        let wrapper = create_wrapper(&settings);

        assert!(validate(&wrapper, &Registry::standard()).valid);
        let content = mailframe_tree::find_by_id(&wrapper, CONTENT_ID).unwrap();
        assert_eq!(content.style().unwrap()["maxWidth"], 640);
        let body = mailframe_tree::find_by_id(&wrapper, BODY_ID).unwrap();
        assert_eq!(body.style().unwrap()["backgroundColor"], json!(settings.background_color));
    }

    #[test]
    fn test_insert_content_preserves_order() {
        let wrapper = create_wrapper(&GlobalSettings::default());
        let filled = insert_content(
            &wrapper,
            vec![
                Node::new("a", "Heading").with_content("A"),
                Node::new("b", "Text").with_content("B"),
            ],
        )
        .unwrap();
        let again = insert_content(&filled, vec![Node::new("c", "Text")]).unwrap();

        let slot = mailframe_tree::find_by_id(&again, CONTENT_ID).unwrap();
        let ids: Vec<_> = slot.children().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        // input untouched
        assert!(mailframe_tree::find_by_id(&wrapper, CONTENT_ID).unwrap().is_leaf());
    }

    #[test]
    fn test_insert_content_without_slot() {
        let err = insert_content(&Node::new("x", "Container"), vec![]).unwrap_err();
        assert_eq!(err, CompileError::MissingSlot("content"));
    }

    #[test]
    fn test_add_preview_is_first_and_single() {
        let wrapper = create_wrapper(&GlobalSettings::default());
        let once = add_preview(&wrapper, "First").unwrap();
        let twice = add_preview(&once, "Second").unwrap();

        let head = mailframe_tree::find_by_id(&twice, HEAD_ID).unwrap();
        assert_eq!(head.children().len(), 1);
        assert_eq!(head.children()[0].content.as_deref(), Some("Second"));
        assert!(validate(&twice, &Registry::standard()).valid);
    }
}
