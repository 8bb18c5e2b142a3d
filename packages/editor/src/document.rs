//! # Document
//!
//! An immutable document value: the root `doc` node, the selection and any
//! pending stored marks. Commands take a `&Document` and return a new one;
//! cloning is cheap because the root is shared.

use crate::selection::Selection;
use crate::{EditorError, EditorResult};
use nextnote_html::{compile_to_html, parse_html, HtmlOptions};
use nextnote_model::{from_json, from_json_str, to_json, MarkSet, Node, NodeKind, PersistedDoc};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Arc<Node>,
    selection: Selection,
    /// Marks the next typed text receives, overriding the marks at the cursor
    stored_marks: Option<MarkSet>,
}

impl Document {
    /// Wrap a validated tree, putting the cursor at the start of its first
    /// textblock
    pub fn new(root: Node) -> EditorResult<Self> {
        if root.kind != NodeKind::Doc {
            return Err(EditorError::rejected(format!(
                "document root must be a doc, found {}",
                root.kind.name()
            )));
        }
        root.check()?;
        let selection = Selection::cursor(first_cursor(&root));
        Ok(Self {
            root: Arc::new(root),
            selection,
            stored_marks: None,
        })
    }

    /// A document holding one empty paragraph
    pub fn empty() -> Self {
        Self {
            root: Arc::new(Node::empty_doc()),
            selection: Selection::cursor(1),
            stored_marks: None,
        }
    }

    pub fn from_json(persisted: &PersistedDoc) -> EditorResult<Self> {
        Self::new(from_json(persisted)?)
    }

    pub fn from_json_str(source: &str) -> EditorResult<Self> {
        Self::new(from_json_str(source)?)
    }

    /// Best-effort import; never fails
    pub fn from_html(source: &str) -> Self {
        Self::new(parse_html(source)).unwrap_or_else(|err| {
            tracing::warn!(%err, "imported HTML did not validate, starting empty");
            Self::empty()
        })
    }

    pub fn to_json(&self) -> PersistedDoc {
        to_json(&self.root)
    }

    pub fn to_html(&self, options: HtmlOptions) -> String {
        compile_to_html(&self.root, options)
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub(crate) fn root_ref(&self) -> &Arc<Node> {
        &self.root
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn stored_marks(&self) -> Option<&MarkSet> {
        self.stored_marks.as_ref()
    }

    /// Number of valid cursor positions minus one
    pub fn size(&self) -> usize {
        self.root.content_size()
    }

    /// Text of the whole document, one line per block
    pub fn text(&self) -> String {
        self.root.text_between(0, self.size(), "\n")
    }

    pub fn selected_text(&self) -> String {
        self.root
            .text_between(self.selection.from(), self.selection.to(), "\n")
    }

    /// Marks text typed at the cursor would receive
    pub fn active_marks(&self) -> MarkSet {
        match &self.stored_marks {
            Some(marks) => marks.clone(),
            None => self
                .root
                .marks_at(self.selection.head)
                .unwrap_or_default(),
        }
    }

    /// Same tree with another selection; stored marks are dropped
    pub fn with_selection(&self, selection: Selection) -> EditorResult<Self> {
        selection.validate(&self.root)?;
        Ok(Self {
            root: self.root.clone(),
            selection,
            stored_marks: None,
        })
    }

    pub(crate) fn with_stored_marks(&self, marks: Option<MarkSet>) -> Self {
        Self {
            root: self.root.clone(),
            selection: self.selection,
            stored_marks: marks,
        }
    }

    pub(crate) fn from_parts(root: Arc<Node>, selection: Selection) -> Self {
        Self {
            root,
            selection,
            stored_marks: None,
        }
    }

    /// True when both documents hold the same tree object
    pub fn same_tree(&self, other: &Document) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

fn first_cursor(root: &Node) -> usize {
    root.textblock_ranges().first().map_or(0, |&(start, _)| start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_puts_cursor_in_first_textblock() {
        let doc = Document::new(Node::doc(vec![
            Node::horizontal_rule(),
            Node::paragraph_text("hi"),
        ]))
        .unwrap();
        assert_eq!(doc.selection(), Selection::cursor(2));
        assert_eq!(doc.text(), "hi");
    }

    #[test]
    fn test_new_rejects_invalid_tree() {
        let bad = Node::doc(vec![Node::bullet_list(vec![])]);
        assert!(Document::new(bad).is_err());
        assert!(Document::new(Node::paragraph_text("x")).is_err());
    }

    #[test]
    fn test_with_selection_validates() {
        let doc = Document::empty();
        assert!(doc.with_selection(Selection::cursor(2)).is_ok());
        assert!(doc.with_selection(Selection::cursor(3)).is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let doc = Document::from_html("<h2>Plan</h2><p>go</p>");
        let again = Document::from_json(&doc.to_json()).unwrap();
        assert_eq!(again.root(), doc.root());
    }
}
