use nextnote_editor::EditorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "nextnote.config.json";

/// NextNote configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory holding note JSON files
    #[serde(default = "default_notes_dir")]
    pub notes_dir: String,

    /// Log filter used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Indent exported HTML
    #[serde(default)]
    pub pretty_html: bool,

    /// Session settings for `apply`
    #[serde(default)]
    pub editor: EditorConfig,
}

fn default_notes_dir() -> String {
    "notes".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    /// Get absolute path to the notes directory
    pub fn get_notes_dir(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.notes_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            notes_dir: default_notes_dir(),
            log_level: default_log_level(),
            pretty_html: false,
            editor: EditorConfig::default(),
        }
    }
}
