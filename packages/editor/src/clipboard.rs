//! Clipboard values exchanged with the UI.
//!
//! The editor never touches a system clipboard. The UI reads it, hands the
//! resolved values in, and receives values to write back out.

use crate::selection::Selection;
use serde::{Deserialize, Serialize};

/// What a copy produces and what a paste consumes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ClipboardData {
    pub fn html(html: impl Into<String>) -> Self {
        Self {
            html: Some(html.into()),
            text: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            html: None,
            text: Some(text.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.html.as_deref().map_or(true, str::is_empty)
            && self.text.as_deref().map_or(true, str::is_empty)
    }
}

/// Taken when a paste starts; the clipboard read may finish after further
/// edits, and a request whose state moved on is dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasteRequest {
    pub selection: Selection,
    pub version: u64,
}
