//! # NextNote Editor
//!
//! Editing engine for NextNote documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: Node tree, marks, positions, JSON    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: Document + commands + session       │
//! │  - Selection and position mapping           │
//! │  - Commands producing new documents         │
//! │  - Snapshot undo/redo                       │
//! │  - Clipboard contract and note storage      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ html: export for display and clipboard      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Documents are values**: commands never mutate their input
//! 2. **Structural sharing**: unchanged subtrees are shared between versions
//! 3. **All or nothing**: a failed command leaves the document untouched
//! 4. **Explicit session**: no global editor state
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nextnote_editor::{Command, Document, EditSession, EditorConfig};
//!
//! let mut session = EditSession::new("note-1", Document::empty(), EditorConfig::default());
//! let mut events = session.subscribe();
//!
//! session.execute(Command::InsertText { text: "hello".into() })?;
//! session.execute(Command::SelectAll)?;
//! session.execute(Command::toggle_bold())?;
//!
//! let html = session.document().to_html(Default::default());
//! session.execute(Command::Undo)?;
//! ```

mod clipboard;
mod commands;
mod config;
mod document;
mod errors;
mod mapping;
mod selection;
mod session;
mod store;
mod undo_stack;

pub use clipboard::{ClipboardData, PasteRequest};
pub use commands::{Applied, Command};
pub use config::EditorConfig;
pub use document::Document;
pub use errors::{EditorError, EditorResult};
pub use mapping::{Mapping, StepMap, StepRange};
pub use selection::Selection;
pub use session::{EditSession, SessionEvent};
pub use store::{MemoryStore, NoteStore};
pub use undo_stack::{HistoryEntry, UndoStack};

#[cfg(feature = "store")]
pub use store::FileStore;

// Re-export common types for convenience
pub use nextnote_html::HtmlOptions;
pub use nextnote_model::{Mark, MarkType, Node, NodeKind, PersistedDoc, TextAlign};
