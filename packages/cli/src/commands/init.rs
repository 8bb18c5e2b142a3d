use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use nextnote_model::{to_json, Mark, Node};
use std::fs;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Notes directory
    #[arg(short, long, default_value = "notes")]
    pub notes_dir: String,

    /// Indent exported HTML
    #[arg(long)]
    pub pretty_html: bool,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);

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

    println!("{}", "📝 Initializing NextNote notes...".bright_blue().bold());

    let notes_dir = cwd.join(&args.notes_dir);
    if !notes_dir.exists() {
        fs::create_dir_all(&notes_dir)?;
        println!("  {} Created {}/", "✓".green(), args.notes_dir);
    }

    let welcome_file = notes_dir.join("welcome.json");
    if !welcome_file.exists() {
        let json = serde_json::to_string_pretty(&to_json(&welcome_note()))?;
        fs::write(&welcome_file, json)?;
        println!("  {} Created welcome.json", "✓".green());
    }

    let config = Config {
        notes_dir: args.notes_dir.clone(),
        pretty_html: args.pretty_html,
        ..Config::default()
    };
    let config_json = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, config_json)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Notes initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Run: nextnote check");
    println!(
        "  2. Run: nextnote export {}/welcome.json --format html",
        args.notes_dir
    );

    Ok(())
}

fn welcome_note() -> Node {
    Node::doc(vec![
        Node::heading(1, vec![Node::plain_text("Welcome")]),
        Node::paragraph(vec![
            Node::plain_text("Notes are stored as "),
            Node::marked_text("JSON", [Mark::Bold]),
            Node::plain_text(" and export to HTML."),
        ]),
        Node::task_list(vec![
            Node::task_item(true, vec![Node::paragraph_text("Create a notes folder")]),
            Node::task_item(false, vec![Node::paragraph_text("Write something")]),
        ]),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_note_is_valid() {
        welcome_note().check().unwrap();
    }
}
