//! Mark commands. Over a range they restyle text, splitting runs at the
//! range edges; on a collapsed cursor they only change the stored marks.

use super::{stored, textblocks_in, Edit};
use crate::mapping::Mapping;
use crate::{Applied, Document, EditorError, EditorResult};
use nextnote_model::{is_valid_line_height, normalize_inline, Mark, MarkSet, MarkType, Node, NodeRef};
use std::sync::Arc;

pub(super) fn toggle_mark(doc: &Document, mark: &Mark) -> EditorResult<Applied> {
    validate_mark(mark)?;
    let sel = doc.selection();
    if sel.is_collapsed() {
        let mut marks = doc.active_marks();
        if marks.contains(mark) {
            marks.remove(mark.mark_type());
        } else {
            marks.insert(mark.clone());
        }
        return stored(doc, marks);
    }

    let root = doc.root();
    let (from, to) = (sel.from(), sel.to());
    require_text(root, from, to)?;

    // mixed ranges get the mark everywhere
    let active = every_run_has(root, from, to, mark);
    let restyled = if active {
        restyle(root, from, to, |marks| {
            marks.remove(mark.mark_type());
        })
    } else {
        restyle(root, from, to, |marks| marks.insert(mark.clone()))
    };
    Edit::new(restyled, Mapping::Identity).commit(doc)
}

pub(super) fn set_mark(doc: &Document, mark: &Mark) -> EditorResult<Applied> {
    validate_mark(mark)?;
    let sel = doc.selection();
    if sel.is_collapsed() {
        let mut marks = doc.active_marks();
        marks.insert(mark.clone());
        return stored(doc, marks);
    }

    require_text(doc.root(), sel.from(), sel.to())?;
    let restyled = restyle(doc.root(), sel.from(), sel.to(), |marks| {
        marks.insert(mark.clone())
    });
    Edit::new(restyled, Mapping::Identity).commit(doc)
}

pub(super) fn unset_mark(doc: &Document, mark_type: MarkType) -> EditorResult<Applied> {
    let sel = doc.selection();
    if sel.is_collapsed() {
        let mut marks = doc.active_marks();
        marks.remove(mark_type);
        return stored(doc, marks);
    }

    let restyled = restyle(doc.root(), sel.from(), sel.to(), |marks| {
        marks.remove(mark_type);
    });
    Edit::new(restyled, Mapping::Identity).commit(doc)
}

pub(super) fn unset_all_marks(doc: &Document) -> EditorResult<Applied> {
    let sel = doc.selection();
    if sel.is_collapsed() {
        return stored(doc, MarkSet::new());
    }

    let restyled = restyle(doc.root(), sel.from(), sel.to(), |marks| {
        *marks = MarkSet::new();
    });
    Edit::new(restyled, Mapping::Identity).commit(doc)
}

/// Reject marks whose attributes cannot be rendered
pub(crate) fn validate_mark(mark: &Mark) -> EditorResult<()> {
    match mark {
        Mark::TextColor { color } | Mark::Highlight { color } if color.trim().is_empty() => {
            Err(EditorError::invalid("color", "color must not be empty"))
        }
        Mark::FontFamily { name } if name.trim().is_empty() => {
            Err(EditorError::invalid("name", "font family must not be empty"))
        }
        Mark::FontSize { px: 0 } => Err(EditorError::invalid("px", "font size must be positive")),
        Mark::LineHeight { value } if !is_valid_line_height(value) => Err(EditorError::invalid(
            "value",
            format!("'{value}' is not a line height"),
        )),
        Mark::Link { href } => super::inline::parse_href(href).map(|_| ()),
        _ => Ok(()),
    }
}

pub(crate) fn require_text(root: &Node, from: usize, to: usize) -> EditorResult<()> {
    let mut found = false;
    root.nodes_between(from, to, &mut |node: &Node, _, _, _| {
        found |= node.is_text();
        !found
    });
    if found {
        Ok(())
    } else {
        Err(EditorError::rejected("selection contains no text"))
    }
}

/// True when every text run overlapping `from..to` carries exactly `mark`
pub(crate) fn every_run_has(root: &Node, from: usize, to: usize, mark: &Mark) -> bool {
    let mut all = true;
    root.nodes_between(from, to, &mut |node: &Node, _, _, _| {
        if node.is_text() && !node.marks.contains(mark) {
            all = false;
        }
        all
    });
    all
}

/// Rewrite the marks of the text in `from..to`, splitting runs that cross
/// the range edges and re-coalescing afterwards
pub(crate) fn restyle<F>(root: &Node, from: usize, to: usize, mut f: F) -> Node
where
    F: FnMut(&mut MarkSet),
{
    let mut new_root = root.clone();
    for block_pos in textblocks_in(root, from, to) {
        let Some(block) = root.node_at(block_pos) else {
            continue;
        };

        let mut children: Vec<NodeRef> = Vec::with_capacity(block.children.len() + 2);
        let mut pos = block_pos + 1;
        for child in &block.children {
            let size = child.node_size();
            let (start, end) = (from.max(pos), to.min(pos + size));
            if !child.is_text() || start >= end {
                children.push(child.clone());
            } else {
                let (start, end) = (start - pos, end - pos);
                if start > 0 {
                    children.push(Arc::new(child.cut_text(0, start)));
                }
                let mut middle = child.cut_text(start, end);
                f(&mut middle.marks);
                children.push(Arc::new(middle));
                if end < size {
                    children.push(Arc::new(child.cut_text(end, size)));
                }
            }
            pos += size;
        }

        if let Some(target) = new_root.node_at_mut(block_pos) {
            target.children = normalize_inline(children);
        }
    }
    new_root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::Selection;
    use crate::Command;

    fn doc_with(root: Node, selection: Selection) -> Document {
        Document::new(root).unwrap().with_selection(selection).unwrap()
    }

    #[test]
    fn test_toggle_bold_over_word() {
        // "say hello there": hello is 5..10
        let doc = doc_with(
            Node::doc(vec![Node::paragraph_text("say hello there")]),
            Selection::range(5, 10),
        );
        let applied = Command::toggle_bold().apply(&doc).unwrap();
        assert!(applied.committing);

        let paragraph = applied.doc.root().child(0);
        assert_eq!(paragraph.child_count(), 3);
        assert_eq!(paragraph.child(1).text_value(), Some("hello"));
        assert!(paragraph.child(1).marks.has_type(MarkType::Bold));
        assert!(paragraph.child(0).marks.is_empty());
        assert!(paragraph.child(2).marks.is_empty());
    }

    #[test]
    fn test_toggle_twice_restores_tree() {
        let root = Node::doc(vec![
            Node::paragraph_text("one two"),
            Node::paragraph_text("three"),
        ]);
        let doc = doc_with(root.clone(), Selection::range(3, 12));

        let once = Command::toggle_italic().apply(&doc).unwrap().doc;
        let twice = Command::toggle_italic().apply(&once).unwrap().doc;
        assert_eq!(twice.root(), &root);
    }

    #[test]
    fn test_mixed_range_adds_everywhere() {
        let root = Node::doc(vec![Node::paragraph(vec![
            Node::marked_text("ab", [Mark::Bold]),
            Node::plain_text("cd"),
        ])]);
        let doc = doc_with(root, Selection::range(1, 5));

        let applied = Command::toggle_bold().apply(&doc).unwrap();
        let paragraph = applied.doc.root().child(0);
        assert_eq!(paragraph.child_count(), 1);
        assert!(paragraph.child(0).marks.has_type(MarkType::Bold));
    }

    #[test]
    fn test_collapsed_toggle_sets_stored_marks() {
        let doc = doc_with(
            Node::doc(vec![Node::paragraph_text("abc")]),
            Selection::cursor(2),
        );
        let applied = Command::toggle_bold().apply(&doc).unwrap();
        assert!(!applied.committing);
        assert_eq!(applied.doc.root(), doc.root());
        assert!(applied
            .doc
            .stored_marks()
            .map_or(false, |m| m.has_type(MarkType::Bold)));
    }

    #[test]
    fn test_attribute_marks_replace_and_validate() {
        let doc = doc_with(
            Node::doc(vec![Node::paragraph(vec![Node::marked_text(
                "hey",
                [Mark::TextColor {
                    color: "red".to_string(),
                }],
            )])]),
            Selection::range(1, 4),
        );
        let blue = Mark::TextColor {
            color: "blue".to_string(),
        };
        let applied = Command::SetMark { mark: blue.clone() }.apply(&doc).unwrap();
        assert!(applied.doc.root().child(0).child(0).marks.contains(&blue));

        let err = Command::SetMark {
            mark: Mark::FontSize { px: 0 },
        }
        .apply(&doc)
        .unwrap_err();
        assert!(matches!(err, EditorError::InvalidArgument { ref field, .. } if field == "px"));
    }

    #[test]
    fn test_line_height_over_range() {
        // "one two": only "two" is selected
        let doc = doc_with(
            Node::doc(vec![Node::paragraph(vec![Node::marked_text(
                "one two",
                [Mark::Bold],
            )])]),
            Selection::range(5, 8),
        );
        let applied = Command::set_line_height("2").apply(&doc).unwrap();
        assert!(applied.committing);

        let paragraph = applied.doc.root().child(0);
        assert_eq!(paragraph.child_count(), 2);
        assert!(!paragraph.child(0).marks.has_type(MarkType::LineHeight));
        let tall = &paragraph.child(1).marks;
        assert!(tall.has_type(MarkType::Bold));
        assert_eq!(
            tall.get(MarkType::LineHeight),
            Some(&Mark::LineHeight {
                value: "2".to_string()
            })
        );

        let unset = Command::UnsetMark {
            mark_type: MarkType::LineHeight,
        }
        .apply(&applied.doc)
        .unwrap();
        assert_eq!(unset.doc.root(), doc.root());

        let err = Command::set_line_height("tall").apply(&doc).unwrap_err();
        assert!(matches!(err, EditorError::InvalidArgument { ref field, .. } if field == "value"));
    }

    #[test]
    fn test_unset_all_marks() {
        let doc = doc_with(
            Node::doc(vec![Node::paragraph(vec![Node::marked_text(
                "hey",
                [Mark::Bold, Mark::Underline],
            )])]),
            Selection::range(1, 3),
        );
        let applied = Command::UnsetAllMarks.apply(&doc).unwrap();
        let paragraph = applied.doc.root().child(0);
        assert!(paragraph.child(0).marks.is_empty());
        assert_eq!(paragraph.child(1).marks.len(), 2);
    }

    #[test]
    fn test_range_without_text_is_rejected() {
        let doc = doc_with(
            Node::doc(vec![Node::horizontal_rule(), Node::paragraph_text("x")]),
            Selection::range(0, 1),
        );
        let err = Command::toggle_bold().apply(&doc).unwrap_err();
        assert!(matches!(err, EditorError::CommandRejected { .. }));
    }
}
