//! # Component Tree Model
//!
//! A document is a single owned [`Node`] tree. Every node has exactly one
//! parent because children are owned values; there is no way to express a
//! shared subtree or a cycle.
//!
//! ```text
//! Email
//! ├── Head
//! │   └── Preview
//! └── Body
//!     └── Container
//!         ├── Heading
//!         └── Text
//! ```
//!
//! Mutations never touch a tree in place. The operations in
//! [`crate::operations`] clone, patch the clone and hand it back.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Prop map. Ordered so that serialization and rendering are deterministic.
pub type Props = BTreeMap<String, Value>;

/// Key of the nested style mapping inside [`Props`].
pub const STYLE_KEY: &str = "style";

/// One component in the tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique across the whole tree
    pub id: String,

    /// Registry name (`Container`, `Text`, ...)
    pub component_type: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub props: Props,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Absent or empty means leaf
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Node>>,
}

impl Node {
    pub fn new(id: impl Into<String>, component_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            component_type: component_type.into(),
            props: Props::new(),
            content: None,
            children: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    /// Set a single entry of the nested `style` mapping
    pub fn with_style(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let style = self
            .props
            .entry(STYLE_KEY.to_string())
            .or_insert_with(|| Value::Object(Default::default()));
        if !style.is_object() {
            *style = Value::Object(Default::default());
        }
        if let Value::Object(map) = style {
            map.insert(key.into(), value.into());
        }
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = Some(children);
        self
    }

    /// Children as a slice (empty for leaves)
    pub fn children(&self) -> &[Node] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Mutable children list, created on demand
    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        self.children.get_or_insert_with(Vec::new)
    }

    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }

    /// The nested style mapping, if present and well-formed
    pub fn style(&self) -> Option<&serde_json::Map<String, Value>> {
        self.props.get(STYLE_KEY).and_then(Value::as_object)
    }

    /// Number of nodes in this subtree, including `self`
    pub fn subtree_size(&self) -> usize {
        1 + self.children().iter().map(Node::subtree_size).sum::<usize>()
    }

    /// Pre-order visit of every node with its depth (root depth = 0)
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node, usize)) {
        self.walk_at(0, visit);
    }

    fn walk_at<'a>(&'a self, depth: usize, visit: &mut impl FnMut(&'a Node, usize)) {
        visit(self, depth);
        for child in self.children() {
            child.walk_at(depth + 1, visit);
        }
    }

    /// Ids of this subtree in pre-order
    pub fn ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        self.walk(&mut |node, _| ids.push(node.id.as_str()));
        ids
    }
}

/// Partial update for exactly one node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Patch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Props>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PatchError {
    #[error("Patch must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("Unknown patch field: {0}")]
    UnknownField(String),

    #[error("Patch props must be an object")]
    PropsNotAnObject,

    #[error("Patch style must be an object")]
    StyleNotAnObject,

    #[error("Patch content must be a string")]
    ContentNotAString,
}

impl Patch {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            props: None,
            content: Some(content.into()),
        }
    }

    pub fn props(props: Props) -> Self {
        Self {
            props: Some(props),
            content: None,
        }
    }

    /// Patch touching a single style entry
    pub fn style(key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut style = serde_json::Map::new();
        style.insert(key.into(), value.into());
        let mut props = Props::new();
        props.insert(STYLE_KEY.to_string(), Value::Object(style));
        Self::props(props)
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.props.as_ref().map_or(true, BTreeMap::is_empty)
    }

    /// Shape-check a patch that came from an untrusted producer.
    ///
    /// Only `props` and `content` are accepted; structure (`id`,
    /// `children`, `componentType`) can never arrive through a patch.
    pub fn from_untrusted(value: &Value) -> Result<Self, PatchError> {
        let object = value
            .as_object()
            .ok_or_else(|| PatchError::NotAnObject(json_kind(value)))?;

        let mut patch = Patch::default();
        for (key, field) in object {
            match key.as_str() {
                "props" => {
                    let props = field.as_object().ok_or(PatchError::PropsNotAnObject)?;
                    if let Some(style) = props.get(STYLE_KEY) {
                        if !style.is_object() {
                            return Err(PatchError::StyleNotAnObject);
                        }
                    }
                    patch.props = Some(props.clone().into_iter().collect());
                }
                "content" => {
                    let content = field.as_str().ok_or(PatchError::ContentNotAString)?;
                    patch.content = Some(content.to_string());
                }
                other => return Err(PatchError::UnknownField(other.to_string())),
            }
        }
        Ok(patch)
    }

    /// Merge into `node`: props shallow, `style` one level deep, content replaced
    pub fn apply_to(&self, node: &mut Node) {
        if let Some(props) = &self.props {
            for (key, value) in props {
                match (node.props.get_mut(key), value) {
                    (Some(Value::Object(existing)), Value::Object(incoming)) if key == STYLE_KEY => {
                        for (style_key, style_value) in incoming {
                            existing.insert(style_key.clone(), style_value.clone());
                        }
                    }
                    _ => {
                        node.props.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        if let Some(content) = &self.content {
            node.content = Some(content.clone());
        }
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
