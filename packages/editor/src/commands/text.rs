//! Typing, deletion, block splitting and fragment insertion.
//!
//! A range deletion cuts the innermost block container holding both ends
//! into the part before `from` and the part after `to`, then joins the two
//! textblocks the cut went through. Lists and items left empty by the cut
//! are dropped. A range between two cells of one table clears those cells
//! instead.

use super::{container_before, cursor_before, lists, missing, nearest_cursor, tables, Edit};
use crate::mapping::Mapping;
use crate::selection::Selection;
use crate::{Applied, Document, EditorError, EditorResult};
use nextnote_model::{normalize_inline, Node, NodeKind, NodeRef, ResolvedPos};
use std::sync::Arc;

pub(super) fn insert_text(doc: &Document, text: &str) -> EditorResult<Applied> {
    if text.is_empty() {
        return Err(EditorError::invalid("text", "text must not be empty"));
    }
    if text.contains(|c: char| c == '\n' || c == '\r') {
        return Err(EditorError::invalid("text", "line breaks go through splitBlock"));
    }

    let marks = match doc.stored_marks() {
        Some(marks) => marks.clone(),
        None => doc.root().marks_at(doc.selection().from())?,
    };
    let (root, pos) = remove_selection(doc)?;
    let rp = root.resolve(pos)?;
    let block = rp.parent();
    if !block.is_textblock() {
        return Err(EditorError::rejected(
            "text can only be typed inside a paragraph or heading",
        ));
    }

    let offset = rp.parent_offset();
    let mut children = block.cut_children(0, offset);
    children.push(Arc::new(Node::text(text, marks)));
    children.extend(block.cut_children(offset, block.content_size()));

    let mut new_root = root.clone();
    new_root
        .node_at_mut(rp.before(rp.depth()))
        .ok_or_else(|| missing("textblock"))?
        .children = normalize_inline(children);

    let cursor = pos + text.chars().count();
    Edit::new(new_root, Mapping::Identity)
        .with_selection(Selection::cursor(cursor))
        .commit(doc)
}

pub(super) fn delete_selection(doc: &Document) -> EditorResult<Applied> {
    if doc.selection().is_collapsed() {
        return Err(EditorError::rejected("nothing is selected"));
    }
    let (root, cursor) = remove_selection(doc)?;
    Edit::new(root, Mapping::Identity)
        .with_selection(Selection::cursor(cursor))
        .commit(doc)
}

pub(super) fn split_block(doc: &Document) -> EditorResult<Applied> {
    let (root, pos) = remove_selection(doc)?;
    let rp = root.resolve(pos)?;
    let block = rp.parent();
    if !block.is_textblock() {
        return Err(EditorError::rejected(
            "only paragraphs and headings can be split",
        ));
    }
    let depth = rp.depth();
    let container = rp.node(depth - 1);

    if container.kind.is_list_item() {
        // splitting an empty, lone paragraph leaves the list instead
        if block.is_empty_textblock() && container.child_count() == 1 {
            let ordinal = textblock_ordinal(&root, pos);
            if let Some(lifted) = lists::lift_item_at(&root, pos)? {
                let cursor = ordinal
                    .and_then(|i| lifted.textblock_ranges().get(i).map(|&(start, _)| start))
                    .unwrap_or_else(|| nearest_cursor(&lifted, pos));
                return Edit::new(lifted, Mapping::Identity)
                    .with_selection(Selection::cursor(cursor))
                    .commit(doc);
            }
        }
        return split_list_item(doc, &root, &rp);
    }

    let (head, tail) = split_textblock(block, rp.parent_offset());
    let index = rp.index(depth - 1);
    let mut new_root = root.clone();
    new_root
        .container_mut(container_before(&rp, depth - 1))
        .ok_or_else(|| missing("block container"))?
        .children
        .splice(index..=index, [Arc::new(head), Arc::new(tail)]);

    Edit::new(new_root, Mapping::Identity)
        .with_selection(Selection::cursor(pos + 2))
        .commit(doc)
}

/// Insert the blocks of a `doc` fragment at the selection. A fragment of a
/// single textblock is inserted inline.
pub(crate) fn insert_fragment(doc: &Document, fragment: &Node) -> EditorResult<Applied> {
    if fragment.kind != NodeKind::Doc {
        return Err(EditorError::rejected(format!(
            "expected a doc fragment, found {}",
            fragment.kind.name()
        )));
    }
    fragment.check()?;

    let (root, pos) = remove_selection(doc)?;
    let rp = root.resolve(pos)?;
    let parent = rp.parent();
    let blocks = &fragment.children;
    let total: usize = blocks.iter().map(|b| b.node_size()).sum();
    let mut new_root = root.clone();

    let cursor = if parent.is_textblock() {
        let depth = rp.depth();
        let offset = rp.parent_offset();

        if let [only] = blocks.as_slice() {
            if only.is_textblock() {
                let mut children = parent.cut_children(0, offset);
                children.extend(only.children.iter().cloned());
                children.extend(parent.cut_children(offset, parent.content_size()));
                new_root
                    .node_at_mut(rp.before(depth))
                    .ok_or_else(|| missing("textblock"))?
                    .children = normalize_inline(children);
                return Edit::new(new_root, Mapping::Identity)
                    .with_selection(Selection::cursor(pos + only.content_size()))
                    .commit(doc);
            }
        }

        let (head, tail) = split_textblock(parent, offset);
        let mut end = rp.before(depth) + total;
        let mut pieces: Vec<NodeRef> = Vec::with_capacity(blocks.len() + 2);
        if head.content_size() > 0 {
            end += head.node_size();
            pieces.push(Arc::new(head));
        }
        pieces.extend(blocks.iter().cloned());
        if tail.content_size() > 0 {
            pieces.push(Arc::new(tail));
        }

        let index = rp.index(depth - 1);
        new_root
            .container_mut(container_before(&rp, depth - 1))
            .ok_or_else(|| missing("block container"))?
            .children
            .splice(index..=index, pieces);
        cursor_before(&new_root, end)
    } else if parent.kind.is_block_container() {
        let depth = rp.depth();
        let index = rp.index(depth);
        new_root
            .container_mut(container_before(&rp, depth))
            .ok_or_else(|| missing("block container"))?
            .children
            .splice(index..index, blocks.iter().cloned());
        cursor_before(&new_root, pos + total)
    } else {
        return Err(EditorError::rejected(format!(
            "content cannot be inserted inside a {}",
            parent.kind.name()
        )));
    };

    Edit::new(new_root, Mapping::Identity)
        .with_selection(Selection::cursor(cursor))
        .commit(doc)
}

/// The tree with the selected content removed, and the position it leaves
fn remove_selection(doc: &Document) -> EditorResult<(Node, usize)> {
    let sel = doc.selection();
    if sel.is_collapsed() {
        Ok((doc.root().clone(), sel.head))
    } else if sel.node {
        remove_node(doc.root(), sel.from())
    } else {
        delete_range(doc.root(), sel.from(), sel.to())
    }
}

fn delete_range(root: &Node, from: usize, to: usize) -> EditorResult<(Node, usize)> {
    let rf = root.resolve(from)?;
    let rt = root.resolve(to)?;
    let shared = rf.shared_depth(to);

    match rf.node(shared).kind {
        NodeKind::Table => return tables::clear_cells(root, rf.before(shared), from, to),
        NodeKind::TableRow => return tables::clear_cells(root, rf.before(shared - 1), from, to),
        _ => {}
    }

    let depth = (0..=shared)
        .rev()
        .find(|&d| rf.node(d).kind.is_block_container())
        .unwrap_or(0);
    let crosses_table = |rp: &ResolvedPos<'_>| {
        (depth + 1..=rp.depth()).any(|d| rp.node(d).kind == NodeKind::Table)
    };
    if crosses_table(&rf) || crosses_table(&rt) {
        return Err(EditorError::rejected(
            "a deletion cannot cross a table boundary",
        ));
    }

    let container = rf.node(depth);
    let start = rf.start(depth);
    let mut left = container.cut_children(0, from - start);
    let mut right = container.cut_children(to - start, container.content_size());

    // levels cut open on each side, down to the textblock holding the end
    let open_left = if rf.parent().is_textblock() { rf.depth() - depth } else { 0 };
    let open_right = if rt.parent().is_textblock() { rt.depth() - depth } else { 0 };
    if open_left > 0 && open_right > 0 {
        let inline = take_leading_text(&mut right, open_right);
        append_trailing_text(&mut left, open_left, inline);
    }

    let mut children = prune(left);
    join_lists(&mut children, prune(right));
    if children.is_empty() {
        children.push(Arc::new(Node::paragraph(vec![])));
    }

    let mut new_root = root.clone();
    new_root
        .container_mut(container_before(&rf, depth))
        .ok_or_else(|| missing("block container"))?
        .children = children;
    let cursor = if open_left > 0 {
        from
    } else {
        nearest_cursor(&new_root, from)
    };
    Ok((new_root, cursor))
}

/// Remove a selected node. Lists it was the only item of go with it; a
/// container left empty gets an empty paragraph.
fn remove_node(root: &Node, pos: usize) -> EditorResult<(Node, usize)> {
    let rp = root.resolve(pos)?;
    let mut depth = rp.depth();
    if matches!(rp.node(depth).kind, NodeKind::Table | NodeKind::TableRow) {
        return Err(EditorError::rejected(
            "rows and cells are removed with deleteRow and deleteColumn",
        ));
    }
    while depth > 0
        && rp.node(depth).child_count() == 1
        && !rp.node(depth).kind.is_block_container()
    {
        depth -= 1;
    }
    let index = rp.index(depth);
    let removed_at = if depth == rp.depth() {
        pos
    } else {
        rp.before(depth + 1)
    };

    let mut new_root = root.clone();
    let container = new_root
        .container_mut(container_before(&rp, depth))
        .ok_or_else(|| missing("parent"))?;
    container.children.remove(index);
    if container.children.is_empty() {
        container.children.push(Arc::new(Node::paragraph(vec![])));
    }
    let cursor = nearest_cursor(&new_root, removed_at);
    Ok((new_root, cursor))
}

fn split_list_item(doc: &Document, root: &Node, rp: &ResolvedPos<'_>) -> EditorResult<Applied> {
    let item_depth = rp.depth() - 1;
    let list_depth = item_depth - 1;
    let item = rp.node(item_depth);
    let block_index = rp.index(item_depth);
    let (head, tail) = split_textblock(rp.parent(), rp.parent_offset());

    let mut first: Vec<NodeRef> = item.children[..block_index].to_vec();
    first.push(Arc::new(head));
    let mut second: Vec<NodeRef> = vec![Arc::new(tail)];
    second.extend(item.children[block_index + 1..].iter().cloned());

    let new_kind = match item.kind {
        NodeKind::TaskItem { .. } => NodeKind::TaskItem { checked: false },
        _ => NodeKind::ListItem,
    };
    let item_index = rp.index(list_depth);
    let mut new_root = root.clone();
    new_root
        .container_mut(container_before(rp, list_depth))
        .ok_or_else(|| missing("list"))?
        .children
        .splice(
            item_index..=item_index,
            [
                Arc::new(item.copy_with(first)),
                Arc::new(Node::from_refs(new_kind, second)),
            ],
        );

    // </p></li><li><p>
    Edit::new(new_root, Mapping::Identity)
        .with_selection(Selection::cursor(rp.pos + 4))
        .commit(doc)
}

fn split_textblock(block: &Node, offset: usize) -> (Node, Node) {
    let size = block.content_size();
    let head = block.copy_with(block.cut_children(0, offset));
    let mut tail = block.copy_with(block.cut_children(offset, size));
    // a heading split at its end continues as a paragraph
    if offset == size && matches!(block.kind, NodeKind::Heading { .. }) {
        tail.kind = NodeKind::paragraph();
    }
    (head, tail)
}

fn textblock_ordinal(root: &Node, pos: usize) -> Option<usize> {
    root.textblock_ranges()
        .iter()
        .position(|&(start, end)| start <= pos && pos <= end)
}

/// Detach the inline content of the first textblock `open` levels down,
/// dropping wrappers it leaves empty
fn take_leading_text(nodes: &mut Vec<NodeRef>, open: usize) -> Vec<NodeRef> {
    if nodes.is_empty() {
        return Vec::new();
    }
    if open <= 1 {
        return nodes.remove(0).children.clone();
    }
    let first = Arc::make_mut(&mut nodes[0]);
    let inline = take_leading_text(&mut first.children, open - 1);
    if first.children.is_empty() {
        nodes.remove(0);
    }
    inline
}

fn append_trailing_text(nodes: &mut [NodeRef], open: usize, inline: Vec<NodeRef>) {
    let Some(last) = nodes.last_mut() else {
        return;
    };
    let last = Arc::make_mut(last);
    if open <= 1 {
        let mut children = std::mem::take(&mut last.children);
        children.extend(inline);
        last.children = normalize_inline(children);
    } else {
        append_trailing_text(&mut last.children, open - 1, inline);
    }
}

/// Drop lists and list items left without children
fn prune(nodes: Vec<NodeRef>) -> Vec<NodeRef> {
    nodes
        .into_iter()
        .filter_map(|node| {
            if !(node.kind.is_list() || node.kind.is_list_item()) {
                return Some(node);
            }
            let children = prune(node.children.clone());
            if children.is_empty() {
                return None;
            }
            let unchanged = children.len() == node.children.len()
                && children
                    .iter()
                    .zip(&node.children)
                    .all(|(a, b)| Arc::ptr_eq(a, b));
            Some(if unchanged {
                node
            } else {
                Arc::new(node.copy_with(children))
            })
        })
        .collect()
}

/// Append `right` to `left`, merging two lists of the same kind meeting at
/// the seam
fn join_lists(left: &mut Vec<NodeRef>, mut right: Vec<NodeRef>) {
    let joins = matches!(
        (left.last(), right.first()),
        (Some(a), Some(b)) if a.kind.is_list() && a.kind == b.kind
    );
    if joins {
        let first = right.remove(0);
        if let Some(last) = left.last_mut() {
            Arc::make_mut(last)
                .children
                .extend(first.children.iter().cloned());
        }
    }
    left.extend(right);
}
