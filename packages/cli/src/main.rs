mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    apply, check, export, import, init, ApplyArgs, CheckArgs, ExportArgs, ImportArgs, InitArgs,
};
use config::Config;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// NextNote CLI - validate, convert and script rich-text notes
#[derive(Parser, Debug)]
#[command(name = "nextnote")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a config file and a notes directory
    Init(InitArgs),

    /// Validate note files
    Check(CheckArgs),

    /// Export a note as HTML, text or JSON
    Export(ExportArgs),

    /// Import an HTML file as a note
    Import(ImportArgs),

    /// Run a JSON script of editing commands against a note
    Apply(ApplyArgs),
}

fn init_tracing(cwd: &Path) {
    let fallback = Config::load(cwd)
        .map(|config| config.log_level)
        .unwrap_or_else(|_| "warn".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(err) => {
            eprintln!("{} cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };
    init_tracing(&cwd);

    let result = match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Check(args) => check(args, &cwd),
        Command::Export(args) => export(args, &cwd),
        Command::Import(args) => import(args, &cwd),
        Command::Apply(args) => apply(args, &cwd),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
