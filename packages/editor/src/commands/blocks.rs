//! Block type and alignment commands. They only change the kind or the
//! alignment of textblocks, so positions never move.

use super::{textblocks_in, Edit};
use crate::mapping::Mapping;
use crate::{Applied, Document, EditorError, EditorResult};
use nextnote_model::{Node, NodeKind, TextAlign};

pub(super) fn set_paragraph(doc: &Document) -> EditorResult<Applied> {
    retype(doc, |kind| NodeKind::Paragraph {
        align: kind.align().unwrap_or_default(),
    })
}

pub(super) fn toggle_heading(doc: &Document, level: u8) -> EditorResult<Applied> {
    if !(1..=4).contains(&level) {
        return Err(EditorError::invalid(
            "level",
            format!("heading level must be between 1 and 4, got {level}"),
        ));
    }

    let root = doc.root();
    let sel = doc.selection();
    let blocks = selected_textblocks(root, sel.from(), sel.to())?;
    let all_match = blocks.iter().all(|&pos| {
        matches!(root.node_at(pos).map(|n| &n.kind), Some(NodeKind::Heading { level: l, .. }) if *l == level)
    });

    retype(doc, |kind| {
        let align = kind.align().unwrap_or_default();
        if all_match {
            NodeKind::Paragraph { align }
        } else {
            NodeKind::Heading { level, align }
        }
    })
}

pub(super) fn set_text_align(doc: &Document, align: TextAlign) -> EditorResult<Applied> {
    let sel = doc.selection();
    let blocks = selected_textblocks(doc.root(), sel.from(), sel.to())?;

    let mut root = doc.root().clone();
    for pos in blocks {
        if let Some(block) = root.node_at_mut(pos) {
            block.kind.set_align(align);
        }
    }
    Edit::new(root, Mapping::Identity).commit(doc)
}

fn retype(doc: &Document, kind_for: impl Fn(&NodeKind) -> NodeKind) -> EditorResult<Applied> {
    let sel = doc.selection();
    let blocks = selected_textblocks(doc.root(), sel.from(), sel.to())?;

    let mut root = doc.root().clone();
    for pos in blocks {
        if let Some(block) = root.node_at_mut(pos) {
            let kind = kind_for(&block.kind);
            if block.kind != kind {
                block.kind = kind;
            }
        }
    }
    Edit::new(root, Mapping::Identity).commit(doc)
}

fn selected_textblocks(root: &Node, from: usize, to: usize) -> EditorResult<Vec<usize>> {
    let blocks = textblocks_in(root, from, to);
    if blocks.is_empty() {
        return Err(EditorError::rejected("selection contains no paragraph or heading"));
    }
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::Selection;
    use crate::Command;

    fn two_paragraphs(selection: Selection) -> Document {
        let root = Node::doc(vec![Node::paragraph_text("ab"), Node::paragraph_text("cd")]);
        Document::new(root).unwrap().with_selection(selection).unwrap()
    }

    #[test]
    fn test_toggle_heading_on_and_off() {
        let doc = two_paragraphs(Selection::range(2, 6));
        let on = Command::ToggleHeading { level: 2 }.apply(&doc).unwrap().doc;
        assert!(on
            .root()
            .children
            .iter()
            .all(|c| matches!(c.kind, NodeKind::Heading { level: 2, .. })));

        let off = Command::ToggleHeading { level: 2 }.apply(&on).unwrap().doc;
        assert_eq!(off.root(), doc.root());
    }

    #[test]
    fn test_heading_level_is_validated() {
        let doc = two_paragraphs(Selection::cursor(1));
        let err = Command::ToggleHeading { level: 5 }.apply(&doc).unwrap_err();
        assert!(matches!(err, EditorError::InvalidArgument { .. }));
    }

    #[test]
    fn test_set_paragraph_keeps_alignment_and_marks() {
        let mut heading = Node::heading(1, vec![Node::marked_text("t", [nextnote_model::Mark::Bold])]);
        heading.kind.set_align(TextAlign::Right);
        let doc = Document::new(Node::doc(vec![heading])).unwrap();

        let applied = Command::SetParagraph.apply(&doc).unwrap();
        let block = applied.doc.root().child(0);
        assert_eq!(block.kind, NodeKind::Paragraph { align: TextAlign::Right });
        assert_eq!(block.child(0).marks.len(), 1);
    }

    #[test]
    fn test_align_every_selected_block() {
        let doc = two_paragraphs(Selection::range(1, 6));
        let applied = Command::SetTextAlign {
            align: TextAlign::Center,
        }
        .apply(&doc)
        .unwrap();
        assert!(applied
            .doc
            .root()
            .children
            .iter()
            .all(|c| c.kind.align() == Some(TextAlign::Center)));

        let reset = Command::UnsetTextAlign.apply(&applied.doc).unwrap().doc;
        assert_eq!(reset.root(), doc.root());
    }

    #[test]
    fn test_same_alignment_is_not_committing() {
        let doc = two_paragraphs(Selection::cursor(1));
        let applied = Command::SetTextAlign {
            align: TextAlign::Left,
        }
        .apply(&doc)
        .unwrap();
        assert!(!applied.committing);
    }
}
