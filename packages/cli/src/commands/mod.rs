pub mod apply;
pub mod check;
pub mod export;
pub mod import;
pub mod init;

pub use apply::{apply, ApplyArgs};
pub use check::{check, CheckArgs};
pub use export::{export, ExportArgs};
pub use import::{import, ImportArgs};
pub use init::{init, InitArgs};

use anyhow::{Context, Result};
use nextnote_editor::Document;
use std::fs;
use std::path::Path;

/// Read and validate a note file
pub(crate) fn read_note(path: &Path) -> Result<Document> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    Document::from_json_str(&source).with_context(|| format!("invalid note {}", path.display()))
}

/// Write `content` to `out`, or stdout when no path is given
pub(crate) fn write_output(out: Option<&Path>, content: &str) -> Result<String> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, content)?;
            Ok(path.display().to_string())
        }
        None => {
            println!("{content}");
            Ok("stdout".to_string())
        }
    }
}
