use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use mailframe_compiler_html::{add_preview, create_wrapper, insert_content};
use mailframe_editor::StoredDocument;
use mailframe_tree::{GlobalSettings, Node};
use std::fs;
use std::path::{Path, PathBuf};

pub const STARTER_DOCUMENT_NAME: &str = "email.json";

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Directory to initialize (defaults to current directory)
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Force overwrite existing files
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let dir = cwd.join(&args.dir);
    let config_path = dir.join(DEFAULT_CONFIG_NAME);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing Mailframe project...".bright_blue().bold());

    if !dir.exists() {
        fs::create_dir_all(&dir)?;
        println!("  {} Created {}/", "✓".green(), args.dir.display());
    }

    let config = Config::default();
    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);

    let document_path = dir.join(STARTER_DOCUMENT_NAME);
    if !document_path.exists() || args.force {
        let document = StoredDocument {
            root: starter_document(&config.settings)?,
            settings: config.settings.clone(),
        };
        fs::write(&document_path, serde_json::to_string_pretty(&document)?)?;
        println!("  {} Created {}", "✓".green(), STARTER_DOCUMENT_NAME);
    }

    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Edit {}", STARTER_DOCUMENT_NAME);
    println!("  2. Run: mailframe render {}", STARTER_DOCUMENT_NAME);

    Ok(())
}

/// Wrapper with a hero section and a preview line
pub fn starter_document(settings: &GlobalSettings) -> Result<Node> {
    let hero = Node::new("hero", "Section")
        .with_style("padding", "32px 24px")
        .with_children(vec![
            Node::new("hero-title", "Heading")
                .with_prop("level", 1)
                .with_content("Welcome to Mailframe"),
            Node::new("hero-text", "Text")
                .with_content("Edit this email with `mailframe edit`, then render it to HTML."),
            Node::new("hero-cta", "Button")
                .with_prop("href", "https://example.com")
                .with_content("Get started"),
        ]);

    let tree = insert_content(&create_wrapper(settings), vec![hero])?;
    Ok(add_preview(&tree, "Your first Mailframe email")?)
}
