use crate::marks::{Mark, MarkSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared handle to a node; untouched subtrees are shared between versions
pub type NodeRef = Arc<Node>;

/// Block-level horizontal alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    pub fn name(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
            TextAlign::Justify => "justify",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "left" => Some(TextAlign::Left),
            "center" => Some(TextAlign::Center),
            "right" => Some(TextAlign::Right),
            "justify" => Some(TextAlign::Justify),
            _ => None,
        }
    }
}

/// Attributes shared by body and header cells
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellAttrs {
    pub colspan: u32,
    pub rowspan: u32,
    pub background_color: Option<String>,
}

impl Default for CellAttrs {
    fn default() -> Self {
        Self {
            colspan: 1,
            rowspan: 1,
            background_color: None,
        }
    }
}

/// Node kind with its attributes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Doc,
    Paragraph { align: TextAlign },
    Heading { level: u8, align: TextAlign },
    BulletList,
    OrderedList { start: u32 },
    ListItem,
    TaskList,
    TaskItem { checked: bool },
    Table,
    TableRow,
    TableCell(CellAttrs),
    TableHeaderCell(CellAttrs),
    Image { src: String, width: Option<u32> },
    HorizontalRule,
    Text { value: String },
}

impl NodeKind {
    pub fn paragraph() -> Self {
        NodeKind::Paragraph {
            align: TextAlign::Left,
        }
    }

    pub fn heading(level: u8) -> Self {
        NodeKind::Heading {
            level,
            align: TextAlign::Left,
        }
    }

    /// Name used in the persisted format
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Doc => "doc",
            NodeKind::Paragraph { .. } => "paragraph",
            NodeKind::Heading { .. } => "heading",
            NodeKind::BulletList => "bulletList",
            NodeKind::OrderedList { .. } => "orderedList",
            NodeKind::ListItem => "listItem",
            NodeKind::TaskList => "taskList",
            NodeKind::TaskItem { .. } => "taskItem",
            NodeKind::Table => "table",
            NodeKind::TableRow => "tableRow",
            NodeKind::TableCell(_) => "tableCell",
            NodeKind::TableHeaderCell(_) => "tableHeaderCell",
            NodeKind::Image { .. } => "image",
            NodeKind::HorizontalRule => "horizontalRule",
            NodeKind::Text { .. } => "text",
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, NodeKind::Text { .. })
    }

    /// Paragraph or heading: a block whose content is text
    pub fn is_textblock(&self) -> bool {
        matches!(self, NodeKind::Paragraph { .. } | NodeKind::Heading { .. })
    }

    /// Leaf blocks that occupy a single position
    pub fn is_atom(&self) -> bool {
        matches!(self, NodeKind::Image { .. } | NodeKind::HorizontalRule)
    }

    pub fn is_list(&self) -> bool {
        matches!(
            self,
            NodeKind::BulletList | NodeKind::OrderedList { .. } | NodeKind::TaskList
        )
    }

    pub fn is_list_item(&self) -> bool {
        matches!(self, NodeKind::ListItem | NodeKind::TaskItem { .. })
    }

    pub fn is_table_cell(&self) -> bool {
        matches!(self, NodeKind::TableCell(_) | NodeKind::TableHeaderCell(_))
    }

    /// Kinds allowed as children of a block container
    pub fn is_block(&self) -> bool {
        self.is_textblock()
            || self.is_atom()
            || self.is_list()
            || matches!(self, NodeKind::Table)
    }

    /// Kinds whose content is a sequence of blocks
    pub fn is_block_container(&self) -> bool {
        matches!(self, NodeKind::Doc) || self.is_list_item() || self.is_table_cell()
    }

    pub fn cell_attrs(&self) -> Option<&CellAttrs> {
        match self {
            NodeKind::TableCell(attrs) | NodeKind::TableHeaderCell(attrs) => Some(attrs),
            _ => None,
        }
    }

    pub fn cell_attrs_mut(&mut self) -> Option<&mut CellAttrs> {
        match self {
            NodeKind::TableCell(attrs) | NodeKind::TableHeaderCell(attrs) => Some(attrs),
            _ => None,
        }
    }

    pub fn align(&self) -> Option<TextAlign> {
        match self {
            NodeKind::Paragraph { align } | NodeKind::Heading { align, .. } => Some(*align),
            _ => None,
        }
    }

    pub fn set_align(&mut self, value: TextAlign) -> bool {
        match self {
            NodeKind::Paragraph { align } | NodeKind::Heading { align, .. } => {
                *align = value;
                true
            }
            _ => false,
        }
    }

    /// The item kind a list holds
    pub fn item_kind(&self) -> Option<NodeKind> {
        match self {
            NodeKind::BulletList | NodeKind::OrderedList { .. } => Some(NodeKind::ListItem),
            NodeKind::TaskList => Some(NodeKind::TaskItem { checked: false }),
            _ => None,
        }
    }
}

/// One element of the document tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub children: Vec<NodeRef>,
    /// Only ever non-empty on text nodes
    pub marks: MarkSet,
}

impl Node {
    pub fn new(kind: NodeKind, children: Vec<Node>) -> Self {
        Self::from_refs(kind, children.into_iter().map(Arc::new).collect())
    }

    pub fn from_refs(kind: NodeKind, children: Vec<NodeRef>) -> Self {
        Self {
            kind,
            children,
            marks: MarkSet::new(),
        }
    }

    pub fn leaf(kind: NodeKind) -> Self {
        Self::from_refs(kind, Vec::new())
    }

    pub fn text(value: impl Into<String>, marks: MarkSet) -> Self {
        Self {
            kind: NodeKind::Text {
                value: value.into(),
            },
            children: Vec::new(),
            marks,
        }
    }

    pub fn plain_text(value: impl Into<String>) -> Self {
        Self::text(value, MarkSet::new())
    }

    pub fn marked_text(value: impl Into<String>, marks: impl IntoIterator<Item = Mark>) -> Self {
        Self::text(value, MarkSet::from_marks(marks))
    }

    pub fn doc(children: Vec<Node>) -> Self {
        Self::new(NodeKind::Doc, children)
    }

    /// A document holding one empty paragraph
    pub fn empty_doc() -> Self {
        Self::doc(vec![Self::paragraph(vec![])])
    }

    pub fn paragraph(children: Vec<Node>) -> Self {
        Self::new(NodeKind::paragraph(), children)
    }

    pub fn paragraph_text(text: &str) -> Self {
        if text.is_empty() {
            Self::paragraph(vec![])
        } else {
            Self::paragraph(vec![Self::plain_text(text)])
        }
    }

    pub fn heading(level: u8, children: Vec<Node>) -> Self {
        Self::new(NodeKind::heading(level), children)
    }

    pub fn bullet_list(items: Vec<Node>) -> Self {
        Self::new(NodeKind::BulletList, items)
    }

    pub fn ordered_list(items: Vec<Node>) -> Self {
        Self::new(NodeKind::OrderedList { start: 1 }, items)
    }

    pub fn list_item(children: Vec<Node>) -> Self {
        Self::new(NodeKind::ListItem, children)
    }

    pub fn task_list(items: Vec<Node>) -> Self {
        Self::new(NodeKind::TaskList, items)
    }

    pub fn task_item(checked: bool, children: Vec<Node>) -> Self {
        Self::new(NodeKind::TaskItem { checked }, children)
    }

    pub fn table(rows: Vec<Node>) -> Self {
        Self::new(NodeKind::Table, rows)
    }

    pub fn table_row(cells: Vec<Node>) -> Self {
        Self::new(NodeKind::TableRow, cells)
    }

    pub fn table_cell(children: Vec<Node>) -> Self {
        Self::new(NodeKind::TableCell(CellAttrs::default()), children)
    }

    pub fn header_cell(children: Vec<Node>) -> Self {
        Self::new(NodeKind::TableHeaderCell(CellAttrs::default()), children)
    }

    /// A cell of the given kind holding one empty paragraph
    pub fn empty_cell(header: bool, attrs: CellAttrs) -> Self {
        let kind = if header {
            NodeKind::TableHeaderCell(attrs)
        } else {
            NodeKind::TableCell(attrs)
        };
        Self::new(kind, vec![Self::paragraph(vec![])])
    }

    pub fn image(src: impl Into<String>, width: Option<u32>) -> Self {
        Self::leaf(NodeKind::Image {
            src: src.into(),
            width,
        })
    }

    pub fn horizontal_rule() -> Self {
        Self::leaf(NodeKind::HorizontalRule)
    }

    /// Same kind and marks with new children
    pub fn copy_with(&self, children: Vec<NodeRef>) -> Self {
        Self {
            kind: self.kind.clone(),
            children,
            marks: self.marks.clone(),
        }
    }

    pub fn is_text(&self) -> bool {
        self.kind.is_text()
    }

    pub fn is_textblock(&self) -> bool {
        self.kind.is_textblock()
    }

    pub fn is_atom(&self) -> bool {
        self.kind.is_atom()
    }

    pub fn text_value(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text { value } => Some(value),
            _ => None,
        }
    }

    pub fn child(&self, index: usize) -> &Node {
        &self.children[index]
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Number of positions this node occupies in its parent
    pub fn node_size(&self) -> usize {
        match &self.kind {
            NodeKind::Text { value } => value.chars().count(),
            kind if kind.is_atom() => 1,
            _ => self.content_size() + 2,
        }
    }

    /// Number of positions inside this node
    pub fn content_size(&self) -> usize {
        self.children.iter().map(|c| c.node_size()).sum()
    }

    /// Concatenated text of all descendants
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match &self.kind {
            NodeKind::Text { value } => out.push_str(value),
            _ => {
                for child in &self.children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// A text node restricted to the character range `from..to`
    pub fn cut_text(&self, from: usize, to: usize) -> Node {
        let value = self.text_value().unwrap_or_default();
        Node::text(char_slice(value, from, to), self.marks.clone())
    }

    /// True for a textblock without content (the common "blank line")
    pub fn is_empty_textblock(&self) -> bool {
        self.is_textblock() && self.children.is_empty()
    }
}

/// Substring by character offsets
pub fn char_slice(value: &str, from: usize, to: usize) -> String {
    value.chars().skip(from).take(to.saturating_sub(from)).collect()
}

/// Drop empty text runs and merge neighbours that carry identical marks
pub fn normalize_inline(children: Vec<NodeRef>) -> Vec<NodeRef> {
    let mut out: Vec<NodeRef> = Vec::with_capacity(children.len());
    for child in children {
        if child.text_value().map_or(false, str::is_empty) {
            continue;
        }
        if let (Some(last), Some(value)) = (out.last_mut(), child.text_value()) {
            if last.is_text() && last.marks == child.marks {
                let merged = Arc::make_mut(last);
                if let NodeKind::Text { value: existing } = &mut merged.kind {
                    existing.push_str(value);
                }
                continue;
            }
        }
        out.push(child);
    }
    out
}
