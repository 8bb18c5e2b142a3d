//! # NextNote Model
//!
//! The document tree behind a note.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: Node tree + marks                    │
//! │  - flat positions (resolve, slices)         │
//! │  - table geometry (TableMap / TableGrid)    │
//! │  - structural checks                        │
//! │  - persisted JSON (PersistedDoc)            │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ html: export / best-effort import           │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: commands, history, session          │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Nodes share untouched subtrees through [`NodeRef`] (`Arc<Node>`), so a
//! history of snapshots costs only the edited paths.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nextnote_model::{from_json_str, to_json};
//!
//! let doc = from_json_str(&stored)?;
//! assert_eq!(doc.text_between(0, doc.content_size(), "\n"), "hello");
//! let persisted = to_json(&doc);
//! ```

mod ast;
mod error;
mod marks;
mod position;
mod schema;
mod serializer;
mod slice;
mod table;

pub use ast::{char_slice, normalize_inline, CellAttrs, Node, NodeKind, NodeRef, TextAlign};
pub use error::{ModelError, ModelResult};
pub use marks::{is_valid_line_height, Mark, MarkSet, MarkType};
pub use position::{PathStep, ResolvedPos};
pub use serializer::{
    from_json, from_json_str, to_json, to_json_string, PersistedDoc, PersistedMark,
};
pub use table::{empty_table, CellInfo, GridCell, Rect, TableGrid, TableMap};
