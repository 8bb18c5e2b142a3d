//! Images, links and horizontal rules.

use super::marks::{require_text, restyle};
use super::{block_slot, missing, nearest_cursor, stored, Edit};
use crate::mapping::{Mapping, StepMap};
use crate::selection::Selection;
use crate::{Applied, Document, EditorError, EditorResult};
use nextnote_model::{Mark, MarkType, Node, NodeKind};
use std::sync::Arc;
use url::Url;

/// Links must be absolute URLs
pub(crate) fn parse_href(href: &str) -> EditorResult<Url> {
    Url::parse(href.trim()).map_err(|err| {
        EditorError::invalid("href", format!("'{href}' is not an absolute URL: {err}"))
    })
}

pub(super) fn set_image(doc: &Document, src: &str, width: Option<u32>) -> EditorResult<Applied> {
    if src.trim().is_empty() {
        return Err(EditorError::invalid("src", "image requires a src"));
    }
    if width == Some(0) {
        return Err(EditorError::invalid("width", "image width must be positive"));
    }

    let sel = doc.selection();
    let root = doc.root();
    let kind = NodeKind::Image {
        src: src.to_string(),
        width,
    };

    // a selected image is updated in place
    if let Some(NodeKind::Image { .. }) = sel.selected_node(root).map(|n| &n.kind) {
        let mut new_root = root.clone();
        let image = new_root
            .node_at_mut(sel.from())
            .ok_or_else(|| missing("image"))?;
        image.kind = kind;
        return Edit::new(new_root, Mapping::Identity).commit(doc);
    }

    let slot = block_slot(root, sel.head)?;
    let mut new_root = root.clone();
    new_root
        .container_mut(slot.container)
        .ok_or_else(|| missing("block container"))?
        .children
        .insert(slot.index, Arc::new(Node::leaf(kind)));
    Edit::new(new_root, Mapping::step(StepMap::replace(slot.pos, 0, 1))).commit(doc)
}

pub(super) fn set_link(doc: &Document, href: &str) -> EditorResult<Applied> {
    parse_href(href)?;
    let link = Mark::Link {
        href: href.trim().to_string(),
    };

    let sel = doc.selection();
    let root = doc.root();
    let range = if sel.is_collapsed() {
        mark_run(root, sel.head, MarkType::Link)
    } else {
        require_text(root, sel.from(), sel.to())?;
        Some((sel.from(), sel.to()))
    };

    match range {
        Some((from, to)) => {
            let restyled = restyle(root, from, to, |marks| marks.insert(link.clone()));
            Edit::new(restyled, Mapping::Identity).commit(doc)
        }
        None => {
            let mut marks = doc.active_marks();
            marks.insert(link);
            stored(doc, marks)
        }
    }
}

pub(super) fn unset_link(doc: &Document) -> EditorResult<Applied> {
    let sel = doc.selection();
    let root = doc.root();
    let range = if sel.is_collapsed() {
        mark_run(root, sel.head, MarkType::Link)
    } else {
        Some((sel.from(), sel.to()))
    };

    match range {
        Some((from, to)) => {
            let restyled = restyle(root, from, to, |marks| {
                marks.remove(MarkType::Link);
            });
            Edit::new(restyled, Mapping::Identity).commit(doc)
        }
        None => {
            let mut marks = doc.active_marks();
            marks.remove(MarkType::Link);
            stored(doc, marks)
        }
    }
}

pub(super) fn insert_horizontal_rule(doc: &Document) -> EditorResult<Applied> {
    let root = doc.root();
    let slot = block_slot(root, doc.selection().head)?;

    let mut new_root = root.clone();
    let container = new_root
        .container_mut(slot.container)
        .ok_or_else(|| missing("block container"))?;
    container
        .children
        .insert(slot.index, Arc::new(Node::horizontal_rule()));
    // keep somewhere to type after a rule that ends its container
    if slot.index + 1 == container.children.len() {
        container.children.push(Arc::new(Node::paragraph(vec![])));
    }

    let cursor = nearest_cursor(&new_root, slot.pos + 1);
    Edit::new(new_root, Mapping::Identity)
        .with_selection(Selection::cursor(cursor))
        .commit(doc)
}

/// Extent of the run of text around `pos` carrying the same mark of
/// `mark_type`, joined across neighbouring text nodes
fn mark_run(root: &Node, pos: usize, mark_type: MarkType) -> Option<(usize, usize)> {
    let rp = root.resolve(pos).ok()?;
    let parent = rp.parent();
    if !parent.is_textblock() {
        return None;
    }
    let depth = rp.depth();
    let index = rp.index(depth);
    let has = |i: usize| {
        parent
            .children
            .get(i)
            .map_or(false, |c| c.marks.has_type(mark_type))
    };

    let found = if rp.text_offset() > 0 {
        Some(index).filter(|&i| has(i))
    } else {
        [Some(index), index.checked_sub(1)]
            .into_iter()
            .flatten()
            .find(|&i| has(i))
    }?;
    let mark = parent.children[found].marks.get(mark_type)?.clone();

    let mut first = found;
    while first > 0 && parent.children[first - 1].marks.contains(&mark) {
        first -= 1;
    }
    let mut last = found;
    while last + 1 < parent.child_count() && parent.children[last + 1].marks.contains(&mark) {
        last += 1;
    }

    let start = rp.start(depth);
    Some((
        start + parent.child_offset(first),
        start + parent.child_offset(last + 1),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Command;

    fn doc_with(root: Node, selection: Selection) -> Document {
        Document::new(root).unwrap().with_selection(selection).unwrap()
    }

    fn link(href: &str) -> Mark {
        Mark::Link {
            href: href.to_string(),
        }
    }

    #[test]
    fn test_set_link_requires_absolute_url() {
        let doc = doc_with(
            Node::doc(vec![Node::paragraph_text("site")]),
            Selection::range(1, 5),
        );
        let err = Command::SetLink {
            href: "/relative/path".to_string(),
        }
        .apply(&doc)
        .unwrap_err();
        assert!(matches!(err, EditorError::InvalidArgument { ref field, .. } if field == "href"));

        let applied = Command::SetLink {
            href: "https://example.com".to_string(),
        }
        .apply(&doc)
        .unwrap();
        assert!(applied
            .doc
            .root()
            .child(0)
            .child(0)
            .marks
            .contains(&link("https://example.com")));
    }

    #[test]
    fn test_collapsed_link_edit_extends_over_run() {
        let root = Node::doc(vec![Node::paragraph(vec![
            Node::plain_text("go "),
            Node::marked_text("here", [link("https://a.example")]),
            Node::marked_text("!", [link("https://a.example"), Mark::Bold]),
        ])]);
        // cursor inside "here"
        let doc = doc_with(root, Selection::cursor(6));

        let applied = Command::SetLink {
            href: "https://b.example".to_string(),
        }
        .apply(&doc)
        .unwrap();
        let paragraph = applied.doc.root().child(0);
        assert!(paragraph.child(1).marks.contains(&link("https://b.example")));
        assert!(paragraph.child(2).marks.contains(&link("https://b.example")));
        assert!(paragraph.child(0).marks.is_empty());

        let unlinked = Command::UnsetLink.apply(&applied.doc).unwrap().doc;
        let paragraph = unlinked.root().child(0);
        assert_eq!(paragraph.child_count(), 2);
        assert_eq!(paragraph.child(0).text_value(), Some("go here"));
    }

    #[test]
    fn test_set_image_inserts_block_after_paragraph() {
        let doc = doc_with(
            Node::doc(vec![Node::paragraph_text("cat")]),
            Selection::cursor(2),
        );
        let applied = Command::SetImage {
            src: "data:image/png;base64,AAAA".to_string(),
            width: Some(120),
        }
        .apply(&doc)
        .unwrap();
        let root = applied.doc.root();
        assert_eq!(root.child_count(), 2);
        assert!(matches!(
            root.child(1).kind,
            NodeKind::Image { width: Some(120), .. }
        ));
        assert_eq!(applied.doc.selection(), Selection::cursor(2));
    }

    #[test]
    fn test_set_image_updates_selected_image() {
        let root = Node::doc(vec![
            Node::image("https://example.com/a.png", None),
            Node::paragraph_text("x"),
        ]);
        let doc = doc_with(root.clone(), Selection::select_node(&root, 0).unwrap());
        let applied = Command::SetImage {
            src: "https://example.com/b.png".to_string(),
            width: Some(64),
        }
        .apply(&doc)
        .unwrap();
        assert_eq!(applied.doc.root().child_count(), 2);
        assert_eq!(
            applied.doc.root().child(0).kind,
            NodeKind::Image {
                src: "https://example.com/b.png".to_string(),
                width: Some(64)
            }
        );
        assert!(applied.doc.selection().node);

        let err = Command::SetImage {
            src: " ".to_string(),
            width: None,
        }
        .apply(&doc)
        .unwrap_err();
        assert!(matches!(err, EditorError::InvalidArgument { ref field, .. } if field == "src"));
    }

    #[test]
    fn test_horizontal_rule_at_end_adds_paragraph() {
        let doc = doc_with(
            Node::doc(vec![Node::paragraph_text("end")]),
            Selection::cursor(4),
        );
        let applied = Command::InsertHorizontalRule.apply(&doc).unwrap();
        let root = applied.doc.root();
        assert_eq!(root.child_count(), 3);
        assert_eq!(root.child(1).kind, NodeKind::HorizontalRule);
        // <p>end</p> is 5 wide, the rule 1
        assert_eq!(applied.doc.selection(), Selection::cursor(7));
    }

    #[test]
    fn test_horizontal_rule_in_empty_paragraph_goes_before_it() {
        let applied = Command::InsertHorizontalRule
            .apply(&Document::empty())
            .unwrap();
        let root = applied.doc.root();
        assert_eq!(root.child_count(), 2);
        assert_eq!(root.child(0).kind, NodeKind::HorizontalRule);
        assert_eq!(applied.doc.selection(), Selection::cursor(2));
    }
}
