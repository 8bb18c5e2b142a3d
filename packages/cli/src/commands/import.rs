use super::write_output;
use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use nextnote_editor::Document;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// HTML file to import
    pub file: PathBuf,

    /// Output note file (defaults to <notes dir>/<name>.json)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Print the note instead of writing it
    #[arg(long)]
    pub stdout: bool,
}

pub fn import(args: ImportArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let source_path = cwd.join(&args.file);
    let source = fs::read_to_string(&source_path)
        .with_context(|| format!("cannot read {}", source_path.display()))?;

    let doc = Document::from_html(&source);
    info!(blocks = doc.root().child_count(), "imported html");
    let json = serde_json::to_string_pretty(&doc.to_json())?;

    let out = if args.stdout {
        None
    } else {
        Some(match args.out {
            Some(out) => cwd.join(out),
            None => default_target(&config.get_notes_dir(cwd), &args.file),
        })
    };
    let target = write_output(out.as_deref(), &json)?;
    if out.is_some() {
        println!("  {} {} → {}", "✓".green(), args.file.display(), target);
    }
    Ok(())
}

fn default_target(notes_dir: &Path, file: &Path) -> PathBuf {
    let stem = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("imported");
    notes_dir.join(format!("{stem}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_target_uses_notes_dir() {
        let target = default_target(Path::new("notes"), Path::new("web/page.html"));
        assert_eq!(target, PathBuf::from("notes/page.json"));
    }
}
