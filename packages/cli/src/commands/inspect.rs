use super::load_document;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use mailframe_tree::{breadcrumbs, find_by_id, path_of, Registry};
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct InspectArgs {
    pub document: PathBuf,

    /// Node id to look up
    pub id: String,
}

pub fn inspect(args: InspectArgs, cwd: &Path) -> Result<()> {
    let document = load_document(&cwd.join(&args.document), &Registry::standard())?;
    let node = find_by_id(&document.root, &args.id)
        .ok_or_else(|| anyhow!("No node with id '{}'", args.id))?;
    let path = path_of(&document.root, &args.id).unwrap_or_default();

    println!("{} {}", node.component_type.bright_white().bold(), node.id);
    println!("  Path:   {}", path);
    println!("  Trail:  {}", breadcrumbs(&document.root, &args.id).join(" › "));
    if let Some(content) = &node.content {
        println!("  Content: {:?}", content);
    }
    if !node.props.is_empty() {
        println!("  Props:  {}", serde_json::to_string(&node.props)?);
    }
    println!("  Children: {}", node.children().len());
    Ok(())
}
