use super::read_note;
use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Note files to validate (defaults to every note in the notes directory)
    pub files: Vec<PathBuf>,
}

pub fn check(args: CheckArgs, cwd: &Path) -> Result<()> {
    let files = if args.files.is_empty() {
        let config = Config::load(cwd)?;
        let notes_dir = config.get_notes_dir(cwd);
        if !notes_dir.exists() {
            return Err(anyhow!("Notes directory does not exist: {:?}", notes_dir));
        }
        find_note_files(&notes_dir)
    } else {
        args.files.iter().map(|f| cwd.join(f)).collect()
    };

    if files.is_empty() {
        println!("{}", "⚠️  No notes found".yellow());
        return Ok(());
    }

    println!("{}", "🔍 Checking notes...".bright_blue().bold());

    let mut error_count = 0;
    for file in &files {
        let relative_path = file.strip_prefix(cwd).unwrap_or(file);
        match read_note(file) {
            Ok(doc) => {
                debug!(file = %file.display(), size = doc.size(), "note is valid");
                println!("  {} {}", "✓".green(), relative_path.display());
            }
            Err(e) => {
                error_count += 1;
                eprintln!(
                    "  {} {} - {}",
                    "✗".red(),
                    relative_path.display(),
                    format!("{e:#}").red()
                );
            }
        }
    }

    println!();
    if error_count == 0 {
        println!("{} {} notes valid", "✅".green(), files.len());
        Ok(())
    } else {
        Err(anyhow!("{} of {} notes are invalid", error_count, files.len()))
    }
}

fn find_note_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    files.sort();
    files
}
