use super::{check_document, read_json};
use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use mailframe_tree::Registry;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Document to check
    pub document: PathBuf,
}

pub fn validate(args: ValidateArgs, cwd: &Path) -> Result<()> {
    let value = read_json(&cwd.join(&args.document))?;
    let report = check_document(&value, &Registry::standard())?;

    if report.valid {
        println!("{} {} is valid", "✓".green(), args.document.display());
        return Ok(());
    }

    for error in &report.errors {
        println!("  {} {}", "✗".red(), error);
    }
    bail!(
        "{} has {} validation error(s)",
        args.document.display(),
        report.errors.len()
    )
}
