use super::{read_note, write_output};
use crate::config::Config;
use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;
use nextnote_editor::{Document, HtmlOptions};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Html,
    Text,
    Json,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Note file to export
    pub file: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "html")]
    pub format: ExportFormat,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Indent HTML output (overrides config)
    #[arg(long)]
    pub pretty: bool,

    /// Wrap HTML output in a complete page
    #[arg(long)]
    pub standalone: bool,
}

pub fn export(args: ExportArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let doc = read_note(&cwd.join(&args.file))?;
    let options = HtmlOptions {
        pretty: args.pretty || config.pretty_html,
        standalone: args.standalone,
        title: args
            .file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned()),
        ..HtmlOptions::default()
    };
    let output = render(&doc, args.format, options)?;

    let out = args.out.map(|out| cwd.join(out));
    let target = write_output(out.as_deref(), &output)?;
    if out.is_some() {
        eprintln!("  {} {} → {}", "✓".green(), args.file.display(), target);
    }
    Ok(())
}

pub(crate) fn render(doc: &Document, format: ExportFormat, options: HtmlOptions) -> Result<String> {
    Ok(match format {
        ExportFormat::Html => doc.to_html(options),
        ExportFormat::Text => doc.text(),
        ExportFormat::Json => serde_json::to_string_pretty(&doc.to_json())?,
    })
}
