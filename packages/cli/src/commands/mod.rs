pub mod edit;
pub mod init;
pub mod inspect;
pub mod render;
pub mod stats;
pub mod validate;

pub use edit::{edit, EditArgs};
pub use init::{init, InitArgs};
pub use inspect::{inspect, InspectArgs};
pub use render::{render, RenderArgs};
pub use stats::{stats, StatsArgs};
pub use validate::{validate, ValidateArgs};

use anyhow::{anyhow, Context, Result};
use mailframe_editor::StoredDocument;
use mailframe_tree::{Registry, ValidationReport, Validator};
use serde_json::Value;
use std::path::Path;

/// Raw JSON of a document file
pub fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("{} is not valid JSON", path.display()))
}

/// Shape and model checks on the `root` of a raw document
pub fn check_document(value: &Value, registry: &Registry) -> Result<ValidationReport> {
    let root = value
        .get("root")
        .ok_or_else(|| anyhow!("Document has no \"root\" field"))?;
    Ok(Validator::new(registry).validate_json(root))
}

/// Read a document and refuse it unless it validates
pub fn load_document(path: &Path, registry: &Registry) -> Result<StoredDocument> {
    let value = read_json(path)?;
    let report = check_document(&value, registry)?;
    if !report.valid {
        return Err(anyhow!(
            "{} is not a valid document:\n  {}",
            path.display(),
            report.errors.join("\n  ")
        ));
    }
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(dir: &Path, value: Value) -> std::path::PathBuf {
        let path = dir.join("doc.json");
        std::fs::write(&path, serde_json::to_string(&value).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_load_valid_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            json!({ "root": { "id": "root", "componentType": "Container", "children": [
                { "id": "t", "componentType": "Text", "content": "hi" }
            ] } }),
        );

        let document = load_document(&path, &Registry::standard()).unwrap();
        assert_eq!(document.root.children().len(), 1);
    }

    #[test]
    fn test_load_rejects_children_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            json!({ "root": { "id": "root", "componentType": "Container", "children": {
                "id": "t", "componentType": "Text"
            } } }),
        );

        let err = load_document(&path, &Registry::standard()).unwrap_err();
        assert!(err.to_string().contains("children must be a list"));
    }

    #[test]
    fn test_missing_root_field() {
        let err = check_document(&json!({ "tree": {} }), &Registry::standard()).unwrap_err();
        assert!(err.to_string().contains("root"));
    }
}
