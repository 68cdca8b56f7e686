use super::load_document;
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use mailframe_compiler_html::{RenderOptions, Renderer};
use mailframe_tree::Registry;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Document to render
    pub document: PathBuf,

    /// Write HTML here instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Emit compact HTML without indentation
    #[arg(long)]
    pub compact: bool,
}

pub fn render(args: RenderArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let registry = Registry::standard();
    let document = load_document(&cwd.join(&args.document), &registry)?;

    let options = RenderOptions {
        pretty: config.render.pretty && !args.compact,
        ..config.render
    };
    let output = Renderer::new(&registry).render(&document.root, &document.settings, &options);

    for warning in &output.warnings {
        eprintln!("  {} {}", "⚠".yellow(), warning);
    }

    match args.out {
        Some(out) => {
            let out = cwd.join(out);
            fs::write(&out, &output.html)?;
            eprintln!(
                "  {} {} → {}",
                "✓".green(),
                args.document.display(),
                out.display()
            );
        }
        None => print!("{}", output.html),
    }

    Ok(())
}
