use super::load_document;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use mailframe_tree::{tree_stats, Registry};
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct StatsArgs {
    pub document: PathBuf,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn stats(args: StatsArgs, cwd: &Path) -> Result<()> {
    let registry = Registry::standard();
    let document = load_document(&cwd.join(&args.document), &registry)?;
    let stats = tree_stats(&document.root, &registry);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", args.document.display().to_string().bright_white().bold());
    println!("  Nodes:     {}", stats.node_count);
    println!("  Max depth: {}", stats.max_depth);
    println!("  Editable:  {}", stats.editable_count);
    Ok(())
}
