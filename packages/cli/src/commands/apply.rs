use super::{read_note, write_output};
use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use nextnote_editor::{Command, EditSession};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Note file to edit
    pub file: PathBuf,

    /// JSON array of commands
    #[arg(short, long)]
    pub script: PathBuf,

    /// Output file (defaults to overwriting the note)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Keep going when a command is rejected
    #[arg(long)]
    pub keep_going: bool,
}

pub fn apply(args: ApplyArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let note_path = cwd.join(&args.file);
    let doc = read_note(&note_path)?;

    let script_path = cwd.join(&args.script);
    let script = fs::read_to_string(&script_path)
        .with_context(|| format!("cannot read {}", script_path.display()))?;
    let commands = parse_script(&script)?;

    let mut session = EditSession::new(note_path.display().to_string(), doc, config.editor);
    let rejected = run_script(&mut session, commands, args.keep_going)?;

    let json = serde_json::to_string_pretty(&session.document().to_json())?;
    let out = args.out.map(|out| cwd.join(out)).unwrap_or(note_path);
    let target = write_output(Some(&out), &json)?;

    println!(
        "{} Applied script: {} changes, {} rejected → {}",
        "✅".green(),
        session.version(),
        rejected,
        target
    );
    Ok(())
}

pub(crate) fn parse_script(source: &str) -> Result<Vec<Command>> {
    serde_json::from_str(source).context("script must be a JSON array of commands")
}

/// Execute commands in order; returns how many were rejected
pub(crate) fn run_script(
    session: &mut EditSession,
    commands: Vec<Command>,
    keep_going: bool,
) -> Result<usize> {
    let mut rejected = 0;
    for (index, command) in commands.into_iter().enumerate() {
        let name = command.name();
        match session.execute(command) {
            Ok(_) => {}
            Err(err) if keep_going && err.is_recoverable() => {
                rejected += 1;
                eprintln!("  {} #{} {} - {}", "✗".red(), index, name, err);
            }
            Err(err) => return Err(anyhow!("command #{index} ({name}) failed: {err}")),
        }
    }
    Ok(rejected)
}
