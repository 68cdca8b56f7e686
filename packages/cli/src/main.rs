mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    edit, init, inspect, render, stats, validate, EditArgs, InitArgs, InspectArgs, RenderArgs,
    StatsArgs, ValidateArgs,
};
use tracing_subscriber::EnvFilter;

/// Mailframe CLI - component-tree email documents
#[derive(Parser, Debug)]
#[command(name = "mailframe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log debug output to stderr (otherwise RUST_LOG, default warn)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a config file and a starter document
    Init(InitArgs),

    /// Render a document to HTML
    Render(RenderArgs),

    /// Check a document against the component registry
    Validate(ValidateArgs),

    /// Node count, depth and editable count of a document
    Stats(StatsArgs),

    /// Show where a node sits in a document
    Inspect(InspectArgs),

    /// Change one node and save the document
    Edit(EditArgs),
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(err) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Render(args) => render(args, &cwd),
        Command::Validate(args) => validate(args, &cwd),
        Command::Stats(args) => stats(args, &cwd),
        Command::Inspect(args) => inspect(args, &cwd),
        Command::Edit(args) => edit(args, &cwd),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
