//! List commands.
//!
//! Toggling wraps the selected blocks in a list, converts the enclosing list
//! to another kind, or lifts its items out when it already has the requested
//! kind. Sinking moves items into the previous item; lifting reverses it.
//! Indentation outside lists is rejected.

use super::{container_before, missing, Edit};
use crate::mapping::Mapping;
use crate::{Applied, Document, EditorError, EditorResult};
use nextnote_model::{Node, NodeKind, NodeRef, ResolvedPos};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ListKind {
    Bullet,
    Ordered,
    Task,
}

impl ListKind {
    fn of(kind: &NodeKind) -> Option<Self> {
        match kind {
            NodeKind::BulletList => Some(ListKind::Bullet),
            NodeKind::OrderedList { .. } => Some(ListKind::Ordered),
            NodeKind::TaskList => Some(ListKind::Task),
            _ => None,
        }
    }

    fn node_kind(self) -> NodeKind {
        match self {
            ListKind::Bullet => NodeKind::BulletList,
            ListKind::Ordered => NodeKind::OrderedList { start: 1 },
            ListKind::Task => NodeKind::TaskList,
        }
    }
}

/// The items `first..=last` of the innermost list holding both selection ends
struct ListRange {
    /// Position before the list
    list_pos: usize,
    /// Depth of the list in the resolved path
    depth: usize,
    first: usize,
    last: usize,
}

fn find_list_range(root: &Node, from: usize, to: usize) -> EditorResult<Option<ListRange>> {
    let rf = root.resolve(from)?;
    let rt = root.resolve(to)?;
    let shared = rf.shared_depth(to);
    let Some(depth) = (1..=shared).rev().find(|&d| rf.node(d).kind.is_list()) else {
        return Ok(None);
    };

    let list = rf.node(depth);
    let first = rf.index(depth).min(list.child_count() - 1);
    let mut last = rt.index(depth);
    // `to` sitting on the boundary before an item does not select it
    if rt.depth() == depth {
        last = last.saturating_sub(1);
    }
    let last = last.clamp(first, list.child_count() - 1);

    Ok(Some(ListRange {
        list_pos: rf.before(depth),
        depth,
        first,
        last,
    }))
}

pub(super) fn toggle_list(doc: &Document, kind: ListKind) -> EditorResult<Applied> {
    let root = doc.root();
    let sel = doc.selection();

    if let Some(range) = find_list_range(root, sel.from(), sel.to())? {
        let list = root.node_at(range.list_pos).ok_or_else(|| missing("list"))?;
        let new_root = if ListKind::of(&list.kind) == Some(kind) {
            lift(root, sel.from(), &range)?
        } else {
            convert_list(root, range.list_pos, kind)?
        };
        return Edit::new(new_root, Mapping::Textblocks).commit(doc);
    }

    // a range starting above the lists, such as select all
    let blocks = block_range(root, sel.from(), sel.to())?;
    let new_root = if blocks
        .selected()
        .iter()
        .all(|block| ListKind::of(&block.kind) == Some(kind))
    {
        unwrap_lists(root, &blocks)?
    } else {
        wrap_in_list(root, &blocks, kind)?
    };
    Edit::new(new_root, Mapping::Textblocks).commit(doc)
}

pub(super) fn lift_list_item(doc: &Document) -> EditorResult<Applied> {
    let root = doc.root();
    let sel = doc.selection();
    let range = find_list_range(root, sel.from(), sel.to())?
        .ok_or_else(|| EditorError::rejected("selection is not inside a list"))?;

    let new_root = lift(root, sel.from(), &range)?;
    Edit::new(new_root, Mapping::Textblocks).commit(doc)
}

pub(super) fn sink_list_item(doc: &Document) -> EditorResult<Applied> {
    let root = doc.root();
    let sel = doc.selection();
    let range = find_list_range(root, sel.from(), sel.to())?
        .ok_or_else(|| EditorError::rejected("indentation is only available inside lists"))?;
    if range.first == 0 {
        return Err(EditorError::rejected(
            "the first item of a list cannot be indented",
        ));
    }

    let list = root.node_at(range.list_pos).ok_or_else(|| missing("list"))?;
    let moved: Vec<NodeRef> = list.children[range.first..=range.last].to_vec();
    let mut previous = (*list.children[range.first - 1]).clone();

    let joins = previous
        .children
        .last()
        .map_or(false, |last| ListKind::of(&last.kind) == ListKind::of(&list.kind));
    if joins {
        if let Some(nested) = previous.children.last_mut() {
            Arc::make_mut(nested).children.extend(moved);
        }
    } else {
        let kind = match &list.kind {
            NodeKind::OrderedList { .. } => NodeKind::OrderedList { start: 1 },
            other => other.clone(),
        };
        previous
            .children
            .push(Arc::new(Node::from_refs(kind, moved)));
    }

    let mut new_root = root.clone();
    let target = new_root
        .node_at_mut(range.list_pos)
        .ok_or_else(|| missing("list"))?;
    target
        .children
        .splice(range.first - 1..=range.last, [Arc::new(previous)]);
    Edit::new(new_root, Mapping::Textblocks).commit(doc)
}

pub(super) fn toggle_task_checked(doc: &Document) -> EditorResult<Applied> {
    let root = doc.root();
    let rp = root.resolve(doc.selection().from())?;
    let depth = rp
        .find_ancestor(|n| matches!(n.kind, NodeKind::TaskItem { .. }))
        .ok_or_else(|| EditorError::rejected("selection is not inside a task item"))?;

    let mut new_root = root.clone();
    let item = new_root
        .node_at_mut(rp.before(depth))
        .ok_or_else(|| missing("task item"))?;
    if let NodeKind::TaskItem { checked } = &mut item.kind {
        *checked = !*checked;
    }
    Edit::new(new_root, Mapping::Identity).commit(doc)
}

/// Lift the list item around `pos` one level, if there is one
pub(super) fn lift_item_at(root: &Node, pos: usize) -> EditorResult<Option<Node>> {
    match find_list_range(root, pos, pos)? {
        Some(range) => lift(root, pos, &range).map(Some),
        None => Ok(None),
    }
}

/// Lift the items of `range` one level: into the enclosing list when the
/// list is nested, out of the list otherwise
fn lift(root: &Node, from: usize, range: &ListRange) -> EditorResult<Node> {
    let rf = root.resolve(from)?;
    let depth = range.depth;
    let list = rf.node(depth);

    let nested = depth >= 2 && rf.node(depth - 1).kind.is_list_item();
    if nested {
        lift_to_outer_list(root, &rf, range, list)
    } else {
        lift_out_of_list(root, &rf, range, list)
    }
}

fn lift_out_of_list(
    root: &Node,
    rf: &ResolvedPos<'_>,
    range: &ListRange,
    list: &Node,
) -> EditorResult<Node> {
    let parent_depth = range.depth - 1;
    let list_index = rf.index(parent_depth);

    let mut replacement: Vec<NodeRef> = Vec::new();
    if range.first > 0 {
        replacement.push(Arc::new(
            list.copy_with(list.children[..range.first].to_vec()),
        ));
    }
    for item in &list.children[range.first..=range.last] {
        replacement.extend(item.children.iter().cloned());
    }
    if range.last + 1 < list.child_count() {
        replacement.push(Arc::new(
            list.copy_with(list.children[range.last + 1..].to_vec()),
        ));
    }

    let mut new_root = root.clone();
    let before = container_before(rf, parent_depth);
    let container = new_root
        .container_mut(before)
        .ok_or_else(|| missing("list container"))?;
    container
        .children
        .splice(list_index..=list_index, replacement);
    Ok(new_root)
}

fn lift_to_outer_list(
    root: &Node,
    rf: &ResolvedPos<'_>,
    range: &ListRange,
    list: &Node,
) -> EditorResult<Node> {
    let item_depth = range.depth - 1;
    let outer_depth = range.depth - 2;
    let outer = rf.node(outer_depth);
    let item_index = rf.index(outer_depth);
    let list_index = rf.index(item_depth);

    let mut lifted: Vec<NodeRef> = list.children[range.first..=range.last]
        .iter()
        .map(|item| as_item_of(item, &outer.kind))
        .collect();

    // the parent item keeps the items before the range; everything after the
    // range moves under the last lifted item so document order is kept
    let mut parent = rf.node(item_depth).clone();
    let trailing: Vec<NodeRef> = parent.children.drain(list_index + 1..).collect();
    if range.first == 0 {
        parent.children.remove(list_index);
    } else {
        parent.children[list_index] =
            Arc::new(list.copy_with(list.children[..range.first].to_vec()));
    }

    let mut tail: Vec<NodeRef> = Vec::new();
    if range.last + 1 < list.child_count() {
        tail.push(Arc::new(
            list.copy_with(list.children[range.last + 1..].to_vec()),
        ));
    }
    tail.extend(trailing);
    if let Some(last) = lifted.last_mut() {
        Arc::make_mut(last).children.extend(tail);
    }

    let mut replacement = Vec::with_capacity(lifted.len() + 1);
    if !parent.children.is_empty() {
        replacement.push(Arc::new(parent));
    }
    replacement.extend(lifted);

    let mut new_root = root.clone();
    let before = container_before(rf, outer_depth);
    let container = new_root
        .container_mut(before)
        .ok_or_else(|| missing("outer list"))?;
    container
        .children
        .splice(item_index..=item_index, replacement);
    Ok(new_root)
}

/// Rewrite the list at `list_pos` as another kind, converting its items
fn convert_list(root: &Node, list_pos: usize, kind: ListKind) -> EditorResult<Node> {
    let mut new_root = root.clone();
    let list = new_root
        .node_at_mut(list_pos)
        .ok_or_else(|| missing("list"))?;
    let target = kind.node_kind();
    list.children = list
        .children
        .iter()
        .map(|item| as_item_of(item, &target))
        .collect();
    list.kind = target;
    Ok(new_root)
}

/// The sibling blocks `first..=last` of the innermost block container
/// holding both ends of a range
struct BlockRange<'a> {
    container: &'a Node,
    /// Address of the container for [`Node::container_mut`]
    before: Option<usize>,
    first: usize,
    last: usize,
}

impl<'a> BlockRange<'a> {
    fn selected(&self) -> &'a [NodeRef] {
        &self.container.children[self.first..=self.last]
    }

    /// Replace the selected blocks with `blocks`
    fn replace(&self, root: &Node, blocks: Vec<NodeRef>) -> EditorResult<Node> {
        let mut new_root = root.clone();
        let target = new_root
            .container_mut(self.before)
            .ok_or_else(|| missing("block container"))?;
        target.children.splice(self.first..=self.last, blocks);
        Ok(new_root)
    }
}

fn block_range(root: &Node, from: usize, to: usize) -> EditorResult<BlockRange<'_>> {
    let rf = root.resolve(from)?;
    let rt = root.resolve(to)?;
    let shared = rf.shared_depth(to);
    if matches!(rf.node(shared).kind, NodeKind::Table | NodeKind::TableRow) {
        return Err(EditorError::rejected(
            "a list cannot span several table cells",
        ));
    }
    let depth = (0..=shared)
        .rev()
        .find(|&d| rf.node(d).kind.is_block_container())
        .unwrap_or(0);

    let container = rf.node(depth);
    if container.children.is_empty() {
        return Err(EditorError::rejected("nothing to wrap in a list"));
    }
    let count = container.child_count();
    let first = rf.index(depth).min(count - 1);
    let mut last = rt.index(depth);
    if rt.depth() == depth {
        last = last.saturating_sub(1);
    }

    Ok(BlockRange {
        container,
        before: container_before(&rf, depth),
        first,
        last: last.clamp(first, count - 1),
    })
}

/// Wrap the selected blocks in one list of `kind`; selected lists hand their
/// items over instead of being nested
fn wrap_in_list(root: &Node, blocks: &BlockRange<'_>, kind: ListKind) -> EditorResult<Node> {
    let list_kind = kind.node_kind();
    let item_kind = list_kind
        .item_kind()
        .ok_or_else(|| EditorError::rejected("not a list kind"))?;
    let mut items: Vec<NodeRef> = Vec::new();
    for block in blocks.selected() {
        if block.kind.is_list() {
            items.extend(block.children.iter().map(|item| as_item_of(item, &list_kind)));
        } else {
            items.push(Arc::new(Node::from_refs(
                item_kind.clone(),
                vec![block.clone()],
            )));
        }
    }

    // join with neighbouring lists of the same kind
    let container = blocks.container;
    let mut first = blocks.first;
    let mut last = blocks.last;
    let mut list = Node::from_refs(list_kind, items);
    if let Some(prev) = first.checked_sub(1).map(|i| &container.children[i]) {
        if ListKind::of(&prev.kind) == Some(kind) {
            let mut joined = prev.children.clone();
            joined.extend(list.children);
            list = prev.copy_with(joined);
            first -= 1;
        }
    }
    if let Some(next) = container.children.get(last + 1) {
        if ListKind::of(&next.kind) == Some(kind) {
            list.children.extend(next.children.iter().cloned());
            last += 1;
        }
    }

    let joined = BlockRange {
        container,
        before: blocks.before,
        first,
        last,
    };
    joined.replace(root, vec![Arc::new(list)])
}

/// Replace every selected list with the contents of its items
fn unwrap_lists(root: &Node, blocks: &BlockRange<'_>) -> EditorResult<Node> {
    let lifted: Vec<NodeRef> = blocks
        .selected()
        .iter()
        .flat_map(|list| list.children.iter())
        .flat_map(|item| item.children.iter().cloned())
        .collect();
    blocks.replace(root, lifted)
}

/// `item` as an item of a list of `list_kind`
fn as_item_of(item: &NodeRef, list_kind: &NodeKind) -> NodeRef {
    let wanted = match list_kind.item_kind() {
        Some(kind) => kind,
        None => return item.clone(),
    };
    match (&item.kind, &wanted) {
        (NodeKind::TaskItem { .. }, NodeKind::TaskItem { .. })
        | (NodeKind::ListItem, NodeKind::ListItem) => item.clone(),
        _ => {
            let mut converted = (**item).clone();
            converted.kind = wanted;
            Arc::new(converted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::Selection;
    use crate::Command;
    use nextnote_model::to_json;

    fn doc_at(root: Node, selection: Selection) -> Document {
        Document::new(root).unwrap().with_selection(selection).unwrap()
    }

    fn items(texts: &[&str]) -> Vec<Node> {
        texts
            .iter()
            .map(|t| Node::list_item(vec![Node::paragraph_text(t)]))
            .collect()
    }

    #[test]
    fn test_wrap_paragraphs_in_bullet_list() {
        // 0 <p> 1 one 4 </p> 5 <p> 6 two 9 </p> 10
        let doc = doc_at(
            Node::doc(vec![Node::paragraph_text("one"), Node::paragraph_text("two")]),
            Selection::range(2, 7),
        );
        let applied = Command::ToggleBulletList.apply(&doc).unwrap();
        assert_eq!(
            applied.doc.root(),
            &Node::doc(vec![Node::bullet_list(items(&["one", "two"]))])
        );
        // selection follows the text: "o|ne" and "t|wo"
        assert_eq!(applied.doc.selection(), Selection::range(4, 11));
    }

    #[test]
    fn test_toggle_same_kind_unwraps() {
        let wrapped = Node::doc(vec![Node::bullet_list(items(&["one", "two"]))]);
        let doc = doc_at(wrapped, Selection::range(3, 12));
        let applied = Command::ToggleBulletList.apply(&doc).unwrap();
        assert_eq!(
            applied.doc.root(),
            &Node::doc(vec![Node::paragraph_text("one"), Node::paragraph_text("two")])
        );
    }

    #[test]
    fn test_toggle_other_kind_converts() {
        let doc = doc_at(
            Node::doc(vec![Node::bullet_list(items(&["one", "two"]))]),
            Selection::cursor(3),
        );
        let applied = Command::ToggleTaskList.apply(&doc).unwrap();
        let list = applied.doc.root().child(0);
        assert_eq!(list.kind, NodeKind::TaskList);
        assert!(list
            .children
            .iter()
            .all(|i| i.kind == NodeKind::TaskItem { checked: false }));
        assert_eq!(applied.doc.selection(), Selection::cursor(3));
    }

    fn select_all(root: Node) -> Document {
        let selection = Selection::select_all(&root);
        doc_at(root, selection)
    }

    #[test]
    fn test_select_all_toggle_unwraps_whole_list() {
        let paragraphs = Node::doc(vec![
            Node::paragraph_text("one"),
            Node::paragraph_text("two"),
            Node::paragraph_text("three"),
        ]);
        let wrapped = Command::ToggleBulletList
            .apply(&select_all(paragraphs.clone()))
            .unwrap()
            .doc;
        assert_eq!(
            wrapped.root(),
            &Node::doc(vec![Node::bullet_list(items(&["one", "two", "three"]))])
        );

        let unwrapped = Command::ToggleBulletList
            .apply(&select_all(wrapped.root().clone()))
            .unwrap()
            .doc;
        assert_eq!(unwrapped.root(), &paragraphs);
        assert_eq!(unwrapped.text(), "one\ntwo\nthree");
    }

    #[test]
    fn test_select_all_toggle_other_kind_converts() {
        let root = Node::doc(vec![
            Node::bullet_list(items(&["a", "b"])),
            Node::task_list(vec![Node::task_item(true, vec![Node::paragraph_text("c")])]),
        ]);
        let applied = Command::ToggleOrderedList.apply(&select_all(root)).unwrap();

        let converted = applied.doc.root();
        assert_eq!(converted.child_count(), 1);
        let list = converted.child(0);
        assert_eq!(list.kind, NodeKind::OrderedList { start: 1 });
        assert_eq!(list.child_count(), 3);
        assert!(list.children.iter().all(|i| i.kind == NodeKind::ListItem));
        assert_eq!(applied.doc.text(), "a\nb\nc");
    }

    #[test]
    fn test_select_all_mixed_blocks_wraps_without_nesting() {
        let root = Node::doc(vec![
            Node::paragraph_text("intro"),
            Node::bullet_list(items(&["a"])),
        ]);
        let applied = Command::ToggleBulletList.apply(&select_all(root)).unwrap();
        assert_eq!(
            applied.doc.root(),
            &Node::doc(vec![Node::bullet_list(items(&["intro", "a"]))])
        );
    }

    #[test]
    fn test_wrap_joins_previous_list() {
        // 0 <ul> 1 <li> 2 <p> 3 a 4 </p> 5 </li> 6 </ul> 7 <p> 8 b 9 </p> 10
        let doc = doc_at(
            Node::doc(vec![Node::bullet_list(items(&["a"])), Node::paragraph_text("b")]),
            Selection::cursor(8),
        );
        let applied = Command::ToggleBulletList.apply(&doc).unwrap();
        assert_eq!(
            applied.doc.root(),
            &Node::doc(vec![Node::bullet_list(items(&["a", "b"]))])
        );
    }

    #[test]
    fn test_sink_and_lift_round_trip() {
        let flat = Node::doc(vec![Node::bullet_list(items(&["a", "b", "c"]))]);
        // cursor in "b": ul 0, li 1, p 2, a 3, /p 4, /li 5, li 6, p 7, b 8
        let doc = doc_at(flat.clone(), Selection::cursor(8));

        let sunk = Command::SinkListItem.apply(&doc).unwrap().doc;
        let expected = Node::doc(vec![Node::bullet_list(vec![
            Node::list_item(vec![
                Node::paragraph_text("a"),
                Node::bullet_list(items(&["b"])),
            ]),
            Node::list_item(vec![Node::paragraph_text("c")]),
        ])]);
        assert_eq!(sunk.root(), &expected);
        assert_eq!(sunk.selected_text(), "");
        assert_eq!(
            sunk.root().resolve(sunk.selection().head).unwrap().parent().text_content(),
            "b"
        );

        let lifted = Command::LiftListItem.apply(&sunk).unwrap().doc;
        assert_eq!(lifted.root(), &flat);
    }

    #[test]
    fn test_sink_joins_existing_nested_list() {
        let root = Node::doc(vec![Node::bullet_list(vec![
            Node::list_item(vec![
                Node::paragraph_text("a"),
                Node::bullet_list(items(&["x"])),
            ]),
            Node::list_item(vec![Node::paragraph_text("b")]),
        ])]);
        let b_pos = root.textblock_ranges()[2].0;
        let doc = doc_at(root, Selection::cursor(b_pos));

        let sunk = Command::SinkListItem.apply(&doc).unwrap().doc;
        let nested = sunk.root().child(0).child(0).child(1);
        assert_eq!(nested.child_count(), 2);
        assert_eq!(sunk.root().child(0).child_count(), 1);
    }

    #[test]
    fn test_sink_first_item_is_rejected() {
        let doc = doc_at(
            Node::doc(vec![Node::bullet_list(items(&["a", "b"]))]),
            Selection::cursor(3),
        );
        let err = Command::SinkListItem.apply(&doc).unwrap_err();
        assert!(matches!(err, EditorError::CommandRejected { .. }));
    }

    #[test]
    fn test_lift_outside_list_is_rejected_and_harmless() {
        let doc = doc_at(
            Node::doc(vec![Node::paragraph_text("plain")]),
            Selection::cursor(2),
        );
        let before = serde_json::to_string(&to_json(doc.root())).unwrap();

        let err = Command::LiftListItem.apply(&doc).unwrap_err();
        assert!(matches!(err, EditorError::CommandRejected { .. }));
        assert!(Command::SinkListItem.apply(&doc).is_err());

        let after = serde_json::to_string(&to_json(doc.root())).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_lift_middle_item_splits_list() {
        let doc = doc_at(
            Node::doc(vec![Node::ordered_list(items(&["a", "b", "c"]))]),
            Selection::cursor(8),
        );
        let lifted = Command::LiftListItem.apply(&doc).unwrap().doc;
        let kinds: Vec<&str> = lifted.root().children.iter().map(|c| c.kind.name()).collect();
        assert_eq!(kinds, vec!["orderedList", "paragraph", "orderedList"]);
        assert_eq!(lifted.root().child(1).text_content(), "b");
    }

    #[test]
    fn test_lift_nested_item_keeps_order() {
        // a > [b, c]; lifting b moves c under b
        let root = Node::doc(vec![Node::bullet_list(vec![Node::list_item(vec![
            Node::paragraph_text("a"),
            Node::bullet_list(items(&["b", "c"])),
        ])])]);
        let b_pos = root.textblock_ranges()[1].0;
        let doc = doc_at(root, Selection::cursor(b_pos));

        let lifted = Command::LiftListItem.apply(&doc).unwrap().doc;
        let expected = Node::doc(vec![Node::bullet_list(vec![
            Node::list_item(vec![Node::paragraph_text("a")]),
            Node::list_item(vec![
                Node::paragraph_text("b"),
                Node::bullet_list(items(&["c"])),
            ]),
        ])]);
        assert_eq!(lifted.root(), &expected);
        assert_eq!(lifted.text(), "a\nb\nc");
    }

    #[test]
    fn test_toggle_task_checked() {
        let root = Node::doc(vec![Node::task_list(vec![Node::task_item(
            false,
            vec![Node::paragraph_text("milk")],
        )])]);
        let doc = doc_at(root, Selection::cursor(4));
        let applied = Command::ToggleTaskChecked.apply(&doc).unwrap();
        assert_eq!(
            applied.doc.root().child(0).child(0).kind,
            NodeKind::TaskItem { checked: true }
        );

        let plain = doc_at(Node::doc(vec![Node::paragraph_text("x")]), Selection::cursor(1));
        assert!(Command::ToggleTaskChecked.apply(&plain).is_err());
    }
}
