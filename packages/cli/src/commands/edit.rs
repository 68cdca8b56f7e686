use super::load_document;
use crate::config::Config;
use anyhow::{anyhow, bail, Result};
use clap::Args;
use colored::Colorize;
use mailframe_editor::{EditSession, FileStore};
use mailframe_tree::{Props, Registry};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Document to edit in place
    pub document: PathBuf,

    /// Id of the node to change
    pub id: String,

    /// Replace the node's text content
    #[arg(long)]
    pub content: Option<String>,

    /// Set a style entry, e.g. `--style color=#333333` (repeatable)
    #[arg(long = "style", value_name = "KEY=VALUE")]
    pub styles: Vec<String>,

    /// Set a prop, e.g. `--prop level=2` (repeatable)
    #[arg(long = "prop", value_name = "KEY=VALUE")]
    pub props: Vec<String>,
}

pub fn edit(args: EditArgs, cwd: &Path) -> Result<()> {
    if args.content.is_none() && args.styles.is_empty() && args.props.is_empty() {
        bail!("Nothing to change: pass --content, --style or --prop");
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(args, cwd))
}

async fn run(args: EditArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let registry = Arc::new(Registry::standard());
    let path = cwd.join(&args.document);
    let document = load_document(&path, &registry)?;

    let session = EditSession::new(
        "cli",
        document.root,
        document.settings,
        registry,
        Arc::new(FileStore::new(&path)),
        &config.editor,
    );

    if let Some(content) = args.content {
        session.edit_content(&args.id, content)?;
    }
    for entry in &args.styles {
        let (key, value) = parse_assignment(entry)?;
        session.edit_style(&args.id, &key, value)?;
    }
    if !args.props.is_empty() {
        let props = args
            .props
            .iter()
            .map(|entry| parse_assignment(entry))
            .collect::<Result<Props>>()?;
        session.edit_props(&args.id, props)?;
    }

    let pending = session.pipeline().pending_count();
    let report = session.save().await?;
    println!(
        "  {} Applied {} edit(s) to '{}' → {}",
        "✓".green(),
        pending,
        args.id,
        args.document.display()
    );
    tracing::debug!(stored_id = %report.stored_id, version = report.version, "edit saved");
    Ok(())
}

/// `key=value`, where value is JSON if it parses as JSON and a string otherwise
fn parse_assignment(entry: &str) -> Result<(String, Value)> {
    let (key, raw) = entry
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected KEY=VALUE, got '{}'", entry))?;
    if key.is_empty() {
        bail!("Empty key in '{}'", entry);
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}
