//! Flat position addressing.
//!
//! Every character and every atom occupies one position; every other node
//! occupies its content plus an opening and a closing boundary. Positions are
//! counted from the start of the root's content, so a document's valid
//! positions are `0..=root.content_size()`.

use crate::ast::{char_slice, Node};
use crate::error::{ModelError, ModelResult};
use crate::marks::MarkSet;
use std::sync::Arc;

/// One level of a resolved position
#[derive(Debug, Clone, Copy)]
pub struct PathStep<'a> {
    pub node: &'a Node,
    /// Index of the child the position points into (or before)
    pub index: usize,
    /// Absolute position of the start of `node`'s content
    pub content_start: usize,
}

/// A position resolved against a tree
#[derive(Debug, Clone)]
pub struct ResolvedPos<'a> {
    pub pos: usize,
    path: Vec<PathStep<'a>>,
    text_offset: usize,
}

impl<'a> ResolvedPos<'a> {
    /// Depth of the innermost node containing the position (root is 0)
    pub fn depth(&self) -> usize {
        self.path.len() - 1
    }

    pub fn node(&self, depth: usize) -> &'a Node {
        self.path[depth].node
    }

    pub fn parent(&self) -> &'a Node {
        self.node(self.depth())
    }

    pub fn index(&self, depth: usize) -> usize {
        self.path[depth].index
    }

    /// Start of the content of the node at `depth`
    pub fn start(&self, depth: usize) -> usize {
        self.path[depth].content_start
    }

    /// End of the content of the node at `depth`
    pub fn end(&self, depth: usize) -> usize {
        self.start(depth) + self.node(depth).content_size()
    }

    /// Position directly before the node at `depth` (not defined for the root)
    pub fn before(&self, depth: usize) -> usize {
        debug_assert!(depth > 0, "the root has no position before it");
        self.start(depth) - 1
    }

    /// Position directly after the node at `depth`
    pub fn after(&self, depth: usize) -> usize {
        self.end(depth) + 1
    }

    pub fn parent_offset(&self) -> usize {
        self.pos - self.start(self.depth())
    }

    /// Offset into the text node at `index`, zero when on a boundary
    pub fn text_offset(&self) -> usize {
        self.text_offset
    }

    /// Child indices from the root down to the parent
    pub fn path_indices(&self) -> Vec<usize> {
        self.path.iter().map(|step| step.index).collect()
    }

    pub fn node_after(&self) -> Option<&'a Node> {
        self.parent()
            .children
            .get(self.index(self.depth()))
            .map(|c| &**c)
    }

    pub fn node_before(&self) -> Option<&'a Node> {
        let index = self.index(self.depth());
        if self.text_offset > 0 {
            return self.parent().children.get(index).map(|c| &**c);
        }
        index
            .checked_sub(1)
            .and_then(|i| self.parent().children.get(i))
            .map(|c| &**c)
    }

    /// Deepest depth whose node also contains `pos`
    pub fn shared_depth(&self, pos: usize) -> usize {
        (0..=self.depth())
            .rev()
            .find(|&d| self.start(d) <= pos && self.end(d) >= pos)
            .unwrap_or(0)
    }

    /// Innermost depth whose node satisfies `predicate`
    pub fn find_ancestor(&self, predicate: impl Fn(&Node) -> bool) -> Option<usize> {
        (0..=self.depth()).rev().find(|&d| predicate(self.node(d)))
    }

    /// Marks that text typed at this position would receive
    pub fn marks(&self) -> MarkSet {
        let parent = self.parent();
        if !parent.is_textblock() {
            return MarkSet::new();
        }
        if self.text_offset > 0 {
            return self.node_after().map(|n| n.marks.clone()).unwrap_or_default();
        }
        match (self.node_before(), self.node_after()) {
            (Some(before), after) => {
                let mut marks = before.marks.clone();
                for mark in before.marks.iter() {
                    let kept = mark.mark_type().inclusive()
                        || after.map_or(false, |a| a.marks.contains(mark));
                    if !kept {
                        marks.remove(mark.mark_type());
                    }
                }
                marks
            }
            (None, Some(after)) => after.marks.clone(),
            (None, None) => MarkSet::new(),
        }
    }
}

impl Node {
    /// Resolve a content-relative position
    pub fn resolve(&self, pos: usize) -> ModelResult<ResolvedPos<'_>> {
        let size = self.content_size();
        if pos > size {
            return Err(ModelError::out_of_range(pos, size));
        }

        let mut path = Vec::new();
        let mut node = self;
        let mut start = 0;
        let mut text_offset = 0;
        loop {
            let rel = pos - start;
            let found = node.child_at_offset(rel);
            let index = found.map_or(node.children.len(), |(i, _)| i);
            path.push(PathStep {
                node,
                index,
                content_start: start,
            });
            match found {
                Some((i, offset)) if rel > offset => {
                    let child = &*node.children[i];
                    if child.is_text() {
                        text_offset = rel - offset;
                        break;
                    }
                    node = child;
                    start += offset + 1;
                }
                _ => break,
            }
        }

        Ok(ResolvedPos {
            pos,
            path,
            text_offset,
        })
    }

    /// Child covering content offset `pos` and that child's start offset
    pub fn child_at_offset(&self, pos: usize) -> Option<(usize, usize)> {
        let mut offset = 0;
        for (index, child) in self.children.iter().enumerate() {
            let end = offset + child.node_size();
            if pos < end {
                return Some((index, offset));
            }
            offset = end;
        }
        None
    }

    /// Content offset at which child `index` starts
    pub fn child_offset(&self, index: usize) -> usize {
        self.children[..index].iter().map(|c| c.node_size()).sum()
    }

    /// The node starting exactly at content position `pos`
    pub fn node_at(&self, pos: usize) -> Option<&Node> {
        let (index, offset) = self.child_at_offset(pos)?;
        let child = &*self.children[index];
        if offset == pos {
            return Some(child);
        }
        if child.is_text() || child.is_atom() {
            return None;
        }
        child.node_at(pos - offset - 1)
    }

    /// Mutable access to the node starting at `pos`, copying shared ancestors
    pub fn node_at_mut(&mut self, pos: usize) -> Option<&mut Node> {
        let (index, offset) = self.child_at_offset(pos)?;
        let child = Arc::make_mut(&mut self.children[index]);
        if offset == pos {
            return Some(child);
        }
        if child.is_text() || child.is_atom() {
            return None;
        }
        child.node_at_mut(pos - offset - 1)
    }

    /// Like [`Node::node_at_mut`] but `None` addresses `self`
    pub fn container_mut(&mut self, before: Option<usize>) -> Option<&mut Node> {
        match before {
            None => Some(self),
            Some(pos) => self.node_at_mut(pos),
        }
    }

    /// Visit every node overlapping `from..to` with its absolute position.
    /// Returning `false` from the callback skips the node's descendants.
    pub fn nodes_between<'a, F>(&'a self, from: usize, to: usize, f: &mut F)
    where
        F: FnMut(&'a Node, usize, &'a Node, usize) -> bool,
    {
        self.walk_between(from, to, 0, f);
    }

    fn walk_between<'a, F>(&'a self, from: usize, to: usize, start: usize, f: &mut F)
    where
        F: FnMut(&'a Node, usize, &'a Node, usize) -> bool,
    {
        let mut pos = start;
        for (index, child) in self.children.iter().enumerate() {
            if pos >= to {
                break;
            }
            let end = pos + child.node_size();
            if end > from && f(child, pos, self, index) && !child.children.is_empty() {
                child.walk_between(from, to, pos + 1, f);
            }
            pos = end;
        }
    }

    /// Text in `from..to`, with `block_separator` between blocks
    pub fn text_between(&self, from: usize, to: usize, block_separator: &str) -> String {
        let mut text = String::new();
        let mut separated = true;
        self.nodes_between(from, to, &mut |node: &Node, pos, _, _| {
            if let Some(value) = node.text_value() {
                let start = from.saturating_sub(pos);
                let end = (to - pos).min(node.node_size());
                text.push_str(&char_slice(value, start, end));
                separated = false;
            } else if !separated {
                text.push_str(block_separator);
                separated = true;
            }
            true
        });
        text
    }

    /// Content ranges (start, end) of every textblock, in document order
    pub fn textblock_ranges(&self) -> Vec<(usize, usize)> {
        let mut ranges = Vec::new();
        self.nodes_between(0, self.content_size(), &mut |node: &Node, pos, _, _| {
            if node.is_textblock() {
                ranges.push((pos + 1, pos + 1 + node.content_size()));
                return false;
            }
            true
        });
        ranges
    }

    /// Marks at a position (see [`ResolvedPos::marks`])
    pub fn marks_at(&self, pos: usize) -> ModelResult<MarkSet> {
        Ok(self.resolve(pos)?.marks())
    }
}
