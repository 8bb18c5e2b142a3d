//! Session configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Undo entries kept before the oldest is dropped
    pub history_depth: usize,

    /// Buffered events per subscriber before slow receivers lag
    pub event_capacity: usize,

    /// Largest clipboard payload a paste accepts, in bytes
    pub max_paste_bytes: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: 100,
            event_capacity: 64,
            max_paste_bytes: 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EditorConfig = serde_json::from_str(r#"{"historyDepth": 5}"#).unwrap();
        assert_eq!(config.history_depth, 5);
        assert_eq!(config.event_capacity, 64);
        assert_eq!(config.max_paste_bytes, 1024 * 1024);
    }
}
