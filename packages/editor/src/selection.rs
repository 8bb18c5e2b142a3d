//! # Selection
//!
//! A selection is an `anchor` and a `head` position. The covered range is
//! always `from()..to()`; which end is the anchor is kept but carries no
//! meaning for commands.
//!
//! A node selection covers exactly one non-text node, from the position
//! before it to the position after it.

use crate::mapping::Mapping;
use crate::{EditorError, EditorResult};
use nextnote_model::{ModelError, Node};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,

    /// Set when the selection addresses a whole node
    #[serde(default, skip_serializing_if = "is_false")]
    pub node: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Selection {
    pub fn cursor(pos: usize) -> Self {
        Self {
            anchor: pos,
            head: pos,
            node: false,
        }
    }

    pub fn range(anchor: usize, head: usize) -> Self {
        Self {
            anchor,
            head,
            node: false,
        }
    }

    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    /// Place the cursor at `pos`
    pub fn collapse_to(root: &Node, pos: usize) -> EditorResult<Self> {
        check_pos(root, pos)?;
        Ok(Self::cursor(pos))
    }

    /// Move the head to `pos`, keeping the anchor
    pub fn extend_to(&self, root: &Node, pos: usize) -> EditorResult<Self> {
        check_pos(root, pos)?;
        Ok(Self::range(self.anchor, pos))
    }

    /// Cover the whole document
    pub fn select_all(root: &Node) -> Self {
        Self::range(0, root.content_size())
    }

    /// Select the node starting at `pos`
    pub fn select_node(root: &Node, pos: usize) -> EditorResult<Self> {
        check_pos(root, pos)?;
        match root.node_at(pos) {
            Some(node) if !node.is_text() => Ok(Self {
                anchor: pos,
                head: pos + node.node_size(),
                node: true,
            }),
            _ => Err(EditorError::rejected(format!("no node starts at position {pos}"))),
        }
    }

    /// The node a node selection covers
    pub fn selected_node<'a>(&self, root: &'a Node) -> Option<&'a Node> {
        if self.node {
            root.node_at(self.from())
        } else {
            None
        }
    }

    /// Carry the selection across an edit from `old` to `new`. Node
    /// selections that no longer line up with a node become a cursor.
    pub fn map(&self, mapping: &Mapping, old: &Node, new: &Node) -> Self {
        let size = new.content_size();
        let anchor = mapping.map(self.anchor, 1, old, new).min(size);
        let head = mapping.map(self.head, 1, old, new).min(size);

        if self.node {
            let from = anchor.min(head);
            if let Some(node) = new.node_at(from) {
                if !node.is_text() && from + node.node_size() == anchor.max(head) {
                    return Self {
                        anchor,
                        head,
                        node: true,
                    };
                }
            }
            return Self::cursor(from);
        }
        Self::range(anchor, head)
    }

    /// Reject selections that point outside `root`
    pub fn validate(&self, root: &Node) -> EditorResult<()> {
        check_pos(root, self.anchor)?;
        check_pos(root, self.head)
    }
}

fn check_pos(root: &Node, pos: usize) -> EditorResult<()> {
    let size = root.content_size();
    if pos > size {
        tracing::error!(pos, size, "selection position outside the document");
        return Err(ModelError::out_of_range(pos, size).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        // 0 <p> 1 hello 6 </p> 7 <img> 8
        Node::doc(vec![
            Node::paragraph_text("hello"),
            Node::image("a.png", None),
        ])
    }

    #[test]
    fn test_collapse_and_extend() {
        let doc = sample();
        let sel = Selection::collapse_to(&doc, 2).unwrap();
        assert!(sel.is_collapsed());

        let sel = sel.extend_to(&doc, 5).unwrap();
        assert_eq!((sel.from(), sel.to()), (2, 5));

        let backwards = Selection::range(5, 2);
        assert_eq!((backwards.from(), backwards.to()), (2, 5));
    }

    #[test]
    fn test_out_of_range_is_an_error() {
        let doc = sample();
        let err = Selection::collapse_to(&doc, 9).unwrap_err();
        assert!(matches!(
            err,
            EditorError::Model(ModelError::PositionOutOfRange { pos: 9, size: 8 })
        ));
    }

    #[test]
    fn test_select_node() {
        let doc = sample();
        let sel = Selection::select_node(&doc, 7).unwrap();
        assert_eq!((sel.from(), sel.to()), (7, 8));
        assert_eq!(sel.selected_node(&doc).map(|n| n.kind.name()), Some("image"));

        // a text position does not start a node
        assert!(Selection::select_node(&doc, 2).is_err());
    }

    #[test]
    fn test_select_all() {
        let doc = sample();
        assert_eq!(Selection::select_all(&doc), Selection::range(0, 8));
    }
}
