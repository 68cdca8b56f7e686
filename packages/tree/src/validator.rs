/// Structural validation for component trees
use crate::node::{json_kind, Node, STYLE_KEY};
use crate::path::Path;
use crate::registry::Registry;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Outcome of a validation pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Validator for component trees. Never panics; every problem becomes an
/// entry in the report.
pub struct Validator<'r> {
    registry: &'r Registry,
    errors: Vec<String>,
}

impl<'r> Validator<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            errors: Vec::new(),
        }
    }

    /// Validate a component tree
    pub fn validate(&mut self, root: &Node) -> ValidationReport {
        self.errors.clear();

        let mut seen: HashMap<&str, Path> = HashMap::new();
        self.validate_node(root, Path::root(), &mut seen);

        ValidationReport::from_errors(std::mem::take(&mut self.errors))
    }

    /// Validate untrusted JSON: raw shape first, then the model rules
    pub fn validate_json(&mut self, value: &Value) -> ValidationReport {
        self.errors.clear();
        self.check_shape(value, &Path::root());
        if !self.errors.is_empty() {
            return ValidationReport::from_errors(std::mem::take(&mut self.errors));
        }

        match serde_json::from_value::<Node>(value.clone()) {
            Ok(root) => self.validate(&root),
            Err(e) => ValidationReport::from_errors(vec![format!("root: {}", e)]),
        }
    }

    fn validate_node<'a>(&mut self, node: &'a Node, path: Path, seen: &mut HashMap<&'a str, Path>) {
        if node.id.trim().is_empty() {
            self.errors.push(format!("{}: node has an empty id", path));
        } else if let Some(first) = seen.get(node.id.as_str()) {
            self.errors.push(format!(
                "{}: duplicate id '{}' (first seen at {})",
                path, node.id, first
            ));
        } else {
            seen.insert(node.id.as_str(), path.clone());
        }

        match self.registry.get(&node.component_type) {
            None => {
                self.errors.push(format!(
                    "{}: unknown component type '{}'",
                    path, node.component_type
                ));
            }
            Some(spec) => {
                for key in node.props.keys() {
                    if !spec.allows_prop(key) {
                        self.errors.push(format!(
                            "{}: prop '{}' is not allowed on {}",
                            path, key, spec.kind
                        ));
                    }
                }
                if spec.leaf && !node.is_leaf() {
                    self.errors
                        .push(format!("{}: {} cannot have children", path, spec.kind));
                }
            }
        }

        if let Some(style) = node.props.get(STYLE_KEY) {
            if !style.is_object() {
                self.errors.push(format!(
                    "{}: style must be an object, got {}",
                    path,
                    json_kind(style)
                ));
            }
        }

        for (index, child) in node.children().iter().enumerate() {
            self.validate_node(child, path.child(index), seen);
        }
    }

    fn check_shape(&mut self, value: &Value, path: &Path) {
        let Some(object) = value.as_object() else {
            self.errors
                .push(format!("{}: node must be an object, got {}", path, json_kind(value)));
            return;
        };

        for field in ["id", "componentType"] {
            match object.get(field) {
                Some(Value::String(_)) => {}
                Some(other) => self.errors.push(format!(
                    "{}: {} must be a string, got {}",
                    path,
                    field,
                    json_kind(other)
                )),
                None => self.errors.push(format!("{}: missing {}", path, field)),
            }
        }

        if let Some(props) = object.get("props") {
            if !props.is_object() {
                self.errors
                    .push(format!("{}: props must be an object, got {}", path, json_kind(props)));
            }
        }

        if let Some(content) = object.get("content") {
            if !content.is_string() && !content.is_null() {
                self.errors.push(format!(
                    "{}: content must be a string, got {}",
                    path,
                    json_kind(content)
                ));
            }
        }

        match object.get("children") {
            None | Some(Value::Null) => {}
            Some(Value::Array(children)) => {
                for (index, child) in children.iter().enumerate() {
                    self.check_shape(child, &path.child(index));
                }
            }
            Some(Value::Object(_)) => self.errors.push(format!(
                "{}: children must be a list, got a single node",
                path
            )),
            Some(other) => self.errors.push(format!(
                "{}: children must be a list, got {}",
                path,
                json_kind(other)
            )),
        }
    }
}

/// Validate `root` against `registry`
pub fn validate(root: &Node, registry: &Registry) -> ValidationReport {
    Validator::new(registry).validate(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> Registry {
        Registry::standard()
    }

    #[test]
    fn test_valid_tree() {
        let root = Node::new("c", "Container").with_children(vec![
            Node::new("t", "Text").with_content("hi").with_style("color", "red"),
        ]);
        let report = validate(&root, &registry());
        assert!(report.valid, "{:?}", report.errors);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_reports_every_problem() {
        let root = Node::new("c", "Container").with_children(vec![
            Node::new("", "Text"),
            Node::new("c", "Marquee"),
            Node::new("b", "Button").with_prop("onclick", "alert(1)"),
            Node::new("t", "Text").with_prop("style", "color: red"),
            Node::new("h", "Heading").with_children(vec![Node::new("x", "Text")]),
        ]);

        let report = validate(&root, &registry());
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 6, "{:#?}", report.errors);
        assert!(report.errors[0].contains("empty id"));
        assert!(report.errors[1].contains("duplicate id 'c'"));
        assert!(report.errors[2].contains("unknown component type 'Marquee'"));
        assert!(report.errors[3].contains("prop 'onclick'"));
        assert!(report.errors[4].contains("style must be an object"));
        assert!(report.errors[5].contains("Heading cannot have children"));
    }

    #[test]
    fn test_json_children_must_be_a_list() {
        let value = json!({
            "id": "c",
            "componentType": "Container",
            "children": { "id": "t", "componentType": "Text" }
        });

        let report = Validator::new(&registry()).validate_json(&value);
        assert!(!report.valid);
        assert_eq!(report.errors, vec!["root: children must be a list, got a single node"]);
    }

    #[test]
    fn test_json_shape_errors_carry_paths() {
        let value = json!({
            "id": "c",
            "componentType": "Container",
            "children": [
                { "id": 7, "componentType": "Text" },
                "not a node"
            ]
        });

        let report = Validator::new(&registry()).validate_json(&value);
        assert_eq!(
            report.errors,
            vec![
                "root.children[0]: id must be a string, got number",
                "root.children[1]: node must be an object, got string",
            ]
        );
    }

    #[test]
    fn test_json_valid_input_runs_model_checks() {
        let value = json!({
            "id": "c",
            "componentType": "Container",
            "children": [{ "id": "c", "componentType": "Text" }]
        });

        let report = Validator::new(&registry()).validate_json(&value);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("duplicate id"));
    }
}
