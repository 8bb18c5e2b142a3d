//! # Undo/Redo Stack
//!
//! Snapshot history for an editing session.
//!
//! ## Design
//!
//! - Every committing command records the document it replaced
//! - Snapshots share structure with the live tree, so an entry costs only
//!   the paths the command touched
//! - Undo swaps the current document for the most recent snapshot and keeps
//!   the current one for redo
//! - New commits clear the redo stack
//! - The undo stack is bounded; the oldest entries fall off first
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut stack = UndoStack::with_max_levels(100);
//!
//! let applied = command.apply(&doc)?;
//! if applied.committing {
//!     stack.record(&doc, Some(command.name()));
//!     doc = applied.doc;
//! }
//!
//! if let Some(previous) = stack.undo(&doc) {
//!     doc = previous.into_document();
//! }
//! ```

use crate::selection::Selection;
use crate::Document;
use nextnote_model::Node;
use std::sync::Arc;

/// One recorded document state
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Tree as it was, shared with whatever replaced it
    pub root: Arc<Node>,

    /// Selection at the time
    pub selection: Selection,

    /// Name of the command that moved away from this state
    pub description: Option<String>,
}

impl HistoryEntry {
    fn capture(doc: &Document, description: Option<String>) -> Self {
        Self {
            root: doc.root_ref().clone(),
            selection: doc.selection(),
            description,
        }
    }

    /// Rebuild the document this entry recorded
    pub fn into_document(self) -> Document {
        Document::from_parts(self.root, self.selection)
    }
}

/// Undo/redo stack for document editing
#[derive(Debug)]
pub struct UndoStack {
    /// States before each commit (most recent last)
    undo_stack: Vec<HistoryEntry>,

    /// States undone (most recent last)
    redo_stack: Vec<HistoryEntry>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,
}

impl UndoStack {
    /// Create a new undo stack with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    /// Create an undo stack with custom max levels
    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
        }
    }

    /// Record `doc` as the state a commit is about to replace
    pub fn record(&mut self, doc: &Document, description: Option<&str>) {
        self.undo_stack
            .push(HistoryEntry::capture(doc, description.map(str::to_string)));

        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        // a new edit invalidates the undone future
        self.redo_stack.clear();
    }

    /// Step back: returns the previous state and keeps `current` for redo
    pub fn undo(&mut self, current: &Document) -> Option<HistoryEntry> {
        let entry = self.undo_stack.pop()?;
        self.redo_stack
            .push(HistoryEntry::capture(current, entry.description.clone()));
        Some(entry)
    }

    /// Step forward again after an undo
    pub fn redo(&mut self, current: &Document) -> Option<HistoryEntry> {
        let entry = self.redo_stack.pop()?;
        self.undo_stack
            .push(HistoryEntry::capture(current, entry.description.clone()));
        Some(entry)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get the number of undo levels available
    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get the number of redo levels available
    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Get description of the next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack
            .last()
            .and_then(|entry| entry.description.as_deref())
    }

    /// Get description of the next redo operation
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack
            .last()
            .and_then(|entry| entry.description.as_deref())
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Command;

    fn typed(doc: &Document, text: &str) -> Document {
        Command::InsertText {
            text: text.to_string(),
        }
        .apply(doc)
        .unwrap()
        .doc
    }

    #[test]
    fn test_undo_stack_creation() {
        let stack = UndoStack::new();
        assert_eq!(stack.undo_levels(), 0);
        assert_eq!(stack.redo_levels(), 0);
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_record_undo_redo() {
        let mut stack = UndoStack::new();
        let before = Document::empty();
        let after = typed(&before, "hi");

        stack.record(&before, Some("insertText"));
        assert_eq!(stack.undo_description(), Some("insertText"));

        let undone = stack.undo(&after).unwrap().into_document();
        assert_eq!(undone, before);
        assert!(undone.same_tree(&before));
        assert_eq!(stack.redo_levels(), 1);
        assert_eq!(stack.redo_description(), Some("insertText"));

        let redone = stack.redo(&undone).unwrap().into_document();
        assert_eq!(redone, after);
        assert_eq!(stack.undo_levels(), 1);
        assert_eq!(stack.redo_levels(), 0);
    }

    #[test]
    fn test_new_record_clears_redo() {
        let mut stack = UndoStack::new();
        let first = Document::empty();
        let second = typed(&first, "a");

        stack.record(&first, None);
        let undone = stack.undo(&second).unwrap().into_document();
        assert_eq!(stack.redo_levels(), 1);

        stack.record(&undone, None);
        assert_eq!(stack.redo_levels(), 0);
    }

    #[test]
    fn test_max_levels_enforced() {
        let mut stack = UndoStack::with_max_levels(2);
        let mut doc = Document::empty();
        for i in 0..3 {
            let next = typed(&doc, &i.to_string());
            stack.record(&doc, None);
            doc = next;
        }
        assert_eq!(stack.undo_levels(), 2);

        // the oldest state fell off
        let mut oldest = doc.clone();
        while let Some(entry) = stack.undo(&oldest) {
            oldest = entry.into_document();
        }
        assert_eq!(oldest.text(), "0");
    }

    #[test]
    fn test_empty_stack_returns_none() {
        let mut stack = UndoStack::new();
        let doc = Document::empty();
        assert!(stack.undo(&doc).is_none());
        assert!(stack.redo(&doc).is_none());
    }
}
