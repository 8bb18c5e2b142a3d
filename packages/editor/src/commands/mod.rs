//! # Commands
//!
//! Every editing operation is a [`Command`]. Applying one never mutates the
//! input document; it returns a new [`Document`] or a typed error, so a
//! failed command leaves nothing half-done.
//!
//! ## Command Semantics
//!
//! ### Committing
//! - A command that changes the tree is committing and lands in history
//! - Commands that only move the selection or change stored marks are not
//!
//! ### Selection
//! - After a committing command the selection follows the content through
//!   the command's [`Mapping`]
//! - Commands that rebuild structure (tables, block insertion) place the
//!   cursor explicitly
//!
//! ### Validation
//! - Every committed tree is checked against the schema; a command that
//!   would produce an invalid tree fails instead

mod blocks;
mod inline;
mod lists;
mod marks;
mod search;
mod tables;
mod text;

pub(crate) use text::insert_fragment;

use crate::mapping::Mapping;
use crate::selection::Selection;
use crate::{Document, EditorError, EditorResult};
use nextnote_model::{
    from_json, Mark, MarkSet, MarkType, Node, PersistedDoc, ResolvedPos, TextAlign,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

/// Editing commands, serialized as `{"command": "toggleMark", ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Command {
    // Marks
    ToggleMark {
        mark: Mark,
    },
    SetMark {
        mark: Mark,
    },
    #[serde(rename_all = "camelCase")]
    UnsetMark {
        mark_type: MarkType,
    },
    UnsetAllMarks,

    // Block type and alignment
    SetParagraph,
    ToggleHeading {
        level: u8,
    },
    SetTextAlign {
        align: TextAlign,
    },
    UnsetTextAlign,

    // Lists
    ToggleBulletList,
    ToggleOrderedList,
    ToggleTaskList,
    SinkListItem,
    LiftListItem,
    ToggleTaskChecked,

    // Tables
    #[serde(rename_all = "camelCase")]
    InsertTable {
        rows: usize,
        cols: usize,
        #[serde(default)]
        with_header_row: bool,
    },
    AddRowBefore,
    AddRowAfter,
    AddColumnBefore,
    AddColumnAfter,
    DeleteRow,
    DeleteColumn,
    DeleteTable,
    SetCellAttribute {
        name: String,
        value: serde_json::Value,
    },
    MergeCells,
    SplitCell,
    ToggleHeaderRow,
    ToggleHeaderColumn,

    // Inline objects
    SetImage {
        src: String,
        #[serde(default)]
        width: Option<u32>,
    },
    SetLink {
        href: String,
    },
    UnsetLink,
    InsertHorizontalRule,

    // Text input
    InsertText {
        text: String,
    },
    DeleteSelection,
    SplitBlock,
    InsertContent {
        content: PersistedDoc,
    },
    /// Replace every occurrence of `find` in the document
    ReplaceAll {
        find: String,
        replace: String,
    },

    // Selection
    CollapseTo {
        pos: usize,
    },
    ExtendTo {
        pos: usize,
    },
    SelectAll,
    SelectNode {
        pos: usize,
    },

    // History, executed by the session
    Undo,
    Redo,
}

/// Result of a successful command
#[derive(Debug, Clone)]
pub struct Applied {
    pub doc: Document,
    /// The tree changed; the previous state belongs in history
    pub committing: bool,
}

impl Command {
    pub fn toggle_bold() -> Self {
        Command::ToggleMark { mark: Mark::Bold }
    }

    pub fn toggle_italic() -> Self {
        Command::ToggleMark { mark: Mark::Italic }
    }

    pub fn toggle_underline() -> Self {
        Command::ToggleMark {
            mark: Mark::Underline,
        }
    }

    pub fn toggle_strike() -> Self {
        Command::ToggleMark { mark: Mark::Strike }
    }

    pub fn toggle_superscript() -> Self {
        Command::ToggleMark {
            mark: Mark::Superscript,
        }
    }

    pub fn toggle_subscript() -> Self {
        Command::ToggleMark {
            mark: Mark::Subscript,
        }
    }

    /// Line height as a CSS value such as `1.5` or `24px`
    pub fn set_line_height(value: impl Into<String>) -> Self {
        Command::SetMark {
            mark: Mark::LineHeight {
                value: value.into(),
            },
        }
    }

    /// Name used in logs and history descriptions
    pub fn name(&self) -> &'static str {
        match self {
            Command::ToggleMark { .. } => "toggleMark",
            Command::SetMark { .. } => "setMark",
            Command::UnsetMark { .. } => "unsetMark",
            Command::UnsetAllMarks => "unsetAllMarks",
            Command::SetParagraph => "setParagraph",
            Command::ToggleHeading { .. } => "toggleHeading",
            Command::SetTextAlign { .. } => "setTextAlign",
            Command::UnsetTextAlign => "unsetTextAlign",
            Command::ToggleBulletList => "toggleBulletList",
            Command::ToggleOrderedList => "toggleOrderedList",
            Command::ToggleTaskList => "toggleTaskList",
            Command::SinkListItem => "sinkListItem",
            Command::LiftListItem => "liftListItem",
            Command::ToggleTaskChecked => "toggleTaskChecked",
            Command::InsertTable { .. } => "insertTable",
            Command::AddRowBefore => "addRowBefore",
            Command::AddRowAfter => "addRowAfter",
            Command::AddColumnBefore => "addColumnBefore",
            Command::AddColumnAfter => "addColumnAfter",
            Command::DeleteRow => "deleteRow",
            Command::DeleteColumn => "deleteColumn",
            Command::DeleteTable => "deleteTable",
            Command::SetCellAttribute { .. } => "setCellAttribute",
            Command::MergeCells => "mergeCells",
            Command::SplitCell => "splitCell",
            Command::ToggleHeaderRow => "toggleHeaderRow",
            Command::ToggleHeaderColumn => "toggleHeaderColumn",
            Command::SetImage { .. } => "setImage",
            Command::SetLink { .. } => "setLink",
            Command::UnsetLink => "unsetLink",
            Command::InsertHorizontalRule => "insertHorizontalRule",
            Command::InsertText { .. } => "insertText",
            Command::DeleteSelection => "deleteSelection",
            Command::SplitBlock => "splitBlock",
            Command::InsertContent { .. } => "insertContent",
            Command::ReplaceAll { .. } => "replaceAll",
            Command::CollapseTo { .. } => "collapseTo",
            Command::ExtendTo { .. } => "extendTo",
            Command::SelectAll => "selectAll",
            Command::SelectNode { .. } => "selectNode",
            Command::Undo => "undo",
            Command::Redo => "redo",
        }
    }

    /// Apply the command to `doc`, returning the resulting document
    pub fn apply(&self, doc: &Document) -> EditorResult<Applied> {
        match self {
            Command::ToggleMark { mark } => marks::toggle_mark(doc, mark),
            Command::SetMark { mark } => marks::set_mark(doc, mark),
            Command::UnsetMark { mark_type } => marks::unset_mark(doc, *mark_type),
            Command::UnsetAllMarks => marks::unset_all_marks(doc),

            Command::SetParagraph => blocks::set_paragraph(doc),
            Command::ToggleHeading { level } => blocks::toggle_heading(doc, *level),
            Command::SetTextAlign { align } => blocks::set_text_align(doc, *align),
            Command::UnsetTextAlign => blocks::set_text_align(doc, TextAlign::Left),

            Command::ToggleBulletList => lists::toggle_list(doc, lists::ListKind::Bullet),
            Command::ToggleOrderedList => lists::toggle_list(doc, lists::ListKind::Ordered),
            Command::ToggleTaskList => lists::toggle_list(doc, lists::ListKind::Task),
            Command::SinkListItem => lists::sink_list_item(doc),
            Command::LiftListItem => lists::lift_list_item(doc),
            Command::ToggleTaskChecked => lists::toggle_task_checked(doc),

            Command::InsertTable {
                rows,
                cols,
                with_header_row,
            } => tables::insert_table(doc, *rows, *cols, *with_header_row),
            Command::AddRowBefore => tables::add_row(doc, false),
            Command::AddRowAfter => tables::add_row(doc, true),
            Command::AddColumnBefore => tables::add_column(doc, false),
            Command::AddColumnAfter => tables::add_column(doc, true),
            Command::DeleteRow => tables::delete_row(doc),
            Command::DeleteColumn => tables::delete_column(doc),
            Command::DeleteTable => tables::delete_table(doc),
            Command::SetCellAttribute { name, value } => {
                tables::set_cell_attribute(doc, name, value)
            }
            Command::MergeCells => tables::merge_cells(doc),
            Command::SplitCell => tables::split_cell(doc),
            Command::ToggleHeaderRow => tables::toggle_header(doc, tables::Axis::Row),
            Command::ToggleHeaderColumn => tables::toggle_header(doc, tables::Axis::Column),

            Command::SetImage { src, width } => inline::set_image(doc, src, *width),
            Command::SetLink { href } => inline::set_link(doc, href),
            Command::UnsetLink => inline::unset_link(doc),
            Command::InsertHorizontalRule => inline::insert_horizontal_rule(doc),

            Command::InsertText { text } => text::insert_text(doc, text),
            Command::DeleteSelection => text::delete_selection(doc),
            Command::SplitBlock => text::split_block(doc),
            Command::InsertContent { content } => {
                let fragment = from_json(content)?;
                insert_fragment(doc, &fragment)
            }
            Command::ReplaceAll { find, replace } => search::replace_all(doc, find, replace),

            Command::CollapseTo { pos } => select(doc, Selection::collapse_to(doc.root(), *pos)?),
            Command::ExtendTo { pos } => {
                select(doc, doc.selection().extend_to(doc.root(), *pos)?)
            }
            Command::SelectAll => select(doc, Selection::select_all(doc.root())),
            Command::SelectNode { pos } => select(doc, Selection::select_node(doc.root(), *pos)?),

            Command::Undo | Command::Redo => Err(EditorError::rejected(
                "undo and redo run through an editing session",
            )),
        }
    }

    /// Commands that can never change the tree
    pub fn is_selection_only(&self) -> bool {
        matches!(
            self,
            Command::CollapseTo { .. }
                | Command::ExtendTo { .. }
                | Command::SelectAll
                | Command::SelectNode { .. }
        )
    }
}

fn select(doc: &Document, selection: Selection) -> EditorResult<Applied> {
    Ok(Applied {
        doc: doc.with_selection(selection)?,
        committing: false,
    })
}

/// A non-committing change of the stored marks
pub(crate) fn stored(doc: &Document, marks: MarkSet) -> EditorResult<Applied> {
    Ok(Applied {
        doc: doc.with_stored_marks(Some(marks)),
        committing: false,
    })
}

/// A new tree plus how the selection gets there
pub(crate) struct Edit {
    root: Node,
    mapping: Mapping,
    selection: Option<Selection>,
}

impl Edit {
    pub(crate) fn new(root: Node, mapping: Mapping) -> Self {
        Self {
            root,
            mapping,
            selection: None,
        }
    }

    pub(crate) fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Validate the new tree and build the resulting document
    pub(crate) fn commit(self, doc: &Document) -> EditorResult<Applied> {
        if let Err(err) = self.root.check() {
            error!(%err, "edit produced an invalid tree, discarding it");
            return Err(err.into());
        }

        let old = doc.root();
        let size = self.root.content_size();
        let selection = match self.selection {
            Some(sel) => Selection {
                anchor: sel.anchor.min(size),
                head: sel.head.min(size),
                node: sel.node,
            },
            None => doc.selection().map(&self.mapping, old, &self.root),
        };

        let committing = *old != self.root;
        let root = if committing {
            Arc::new(self.root)
        } else {
            doc.root_ref().clone()
        };
        Ok(Applied {
            doc: Document::from_parts(root, selection),
            committing,
        })
    }
}

/// Positions before every textblock overlapping `from..to`; a collapsed
/// range yields the textblock around it
pub(crate) fn textblocks_in(root: &Node, from: usize, to: usize) -> Vec<usize> {
    let mut found = Vec::new();
    let to = if from == to { to + 1 } else { to };
    root.nodes_between(from, to, &mut |node: &Node, pos, _, _| {
        if node.is_textblock() {
            let end = pos + node.node_size();
            // a collapsed range only counts inside the block
            if from < end && (to > pos + 1 || from > pos) {
                found.push(pos);
            }
            return false;
        }
        true
    });
    found
}

/// Start of the first textblock at or after `pos`, falling back to the end
/// of the last textblock
pub(crate) fn nearest_cursor(root: &Node, pos: usize) -> usize {
    let blocks = root.textblock_ranges();
    blocks
        .iter()
        .find(|&&(start, _)| start >= pos)
        .map(|&(start, _)| start)
        .or_else(|| blocks.last().map(|&(_, end)| end))
        .unwrap_or_else(|| pos.min(root.content_size()))
}

/// End of the last textblock ending at or before `pos`
pub(crate) fn cursor_before(root: &Node, pos: usize) -> usize {
    root.textblock_ranges()
        .iter()
        .rev()
        .find(|&&(_, end)| end <= pos)
        .map(|&(_, end)| end)
        .unwrap_or_else(|| nearest_cursor(root, pos))
}

/// Address of the node at `depth` for [`Node::container_mut`]; the root is
/// `None`
pub(crate) fn container_before(rp: &ResolvedPos<'_>, depth: usize) -> Option<usize> {
    (depth > 0).then(|| rp.before(depth))
}

/// Where a block inserted at the cursor lands
pub(crate) struct BlockSlot {
    /// Address of the container for [`Node::container_mut`]
    pub container: Option<usize>,
    pub index: usize,
    /// Position the inserted block starts at
    pub pos: usize,
    /// The cursor sits in an empty textblock at `index`
    pub in_empty: bool,
}

/// Blocks go after the textblock holding `pos`, or at `index` when that
/// textblock is empty; a cursor directly in a block container inserts there
pub(crate) fn block_slot(root: &Node, pos: usize) -> EditorResult<BlockSlot> {
    let rp = root.resolve(pos)?;
    let parent = rp.parent();
    let (depth, index, in_empty) = if parent.is_textblock() {
        let depth = rp.depth() - 1;
        let index = rp.index(depth);
        if parent.is_empty_textblock() {
            (depth, index, true)
        } else {
            (depth, index + 1, false)
        }
    } else if parent.kind.is_block_container() {
        (rp.depth(), rp.index(rp.depth()), false)
    } else {
        return Err(EditorError::rejected(format!(
            "blocks cannot be inserted inside a {}",
            parent.kind.name()
        )));
    };

    Ok(BlockSlot {
        container: container_before(&rp, depth),
        index,
        pos: rp.start(depth) + rp.node(depth).child_offset(index),
        in_empty,
    })
}

pub(crate) fn missing(what: &str) -> EditorError {
    EditorError::rejected(format!("{what} not found"))
}
