//! # Persisted document format
//!
//! The canonical JSON form of a document, stored in the `data` column of a
//! note record:
//!
//! ```text
//! { "kind": "paragraph", "attrs": { "textAlign": "left" }, "children": [
//!     { "kind": "text", "attrs": {}, "children": [], "text": "hi",
//!       "marks": [ { "type": "bold", "attrs": {} } ] }
//! ] }
//! ```
//!
//! Writing always emits every attribute of a kind, so documents produced by
//! [`to_json`] survive [`from_json`] unchanged. Reading is strict: text runs
//! are taken as stored, so adjacent runs with equal marks or empty runs are
//! rejected rather than merged, as are wrong value types, unknown kinds and
//! any structural violation.
//!
//! The one exception is attributes. Unknown ones are ignored and missing ones
//! take their defaults (`textAlign` is `left`), so notes written before an
//! attribute existed still load; writing them back adds the defaults.

use crate::ast::{CellAttrs, Node, NodeKind, NodeRef, TextAlign};
use crate::error::{ModelError, ModelResult};
use crate::marks::{Mark, MarkSet, MarkType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Persisted node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedDoc {
    pub kind: String,
    #[serde(default)]
    pub attrs: Map<String, Value>,
    #[serde(default)]
    pub children: Vec<PersistedDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<Vec<PersistedMark>>,
}

/// Persisted mark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedMark {
    #[serde(rename = "type")]
    pub mark_type: String,
    #[serde(default)]
    pub attrs: Map<String, Value>,
}

/// Serialize a node (usually the document root)
pub fn to_json(node: &Node) -> PersistedDoc {
    let mut attrs = Map::new();
    match &node.kind {
        NodeKind::Paragraph { align } => {
            attrs.insert("textAlign".into(), align.name().into());
        }
        NodeKind::Heading { level, align } => {
            attrs.insert("level".into(), (*level).into());
            attrs.insert("textAlign".into(), align.name().into());
        }
        NodeKind::OrderedList { start } => {
            attrs.insert("start".into(), (*start).into());
        }
        NodeKind::TaskItem { checked } => {
            attrs.insert("checked".into(), (*checked).into());
        }
        NodeKind::TableCell(cell) | NodeKind::TableHeaderCell(cell) => {
            attrs.insert(
                "backgroundColor".into(),
                cell.background_color.clone().map_or(Value::Null, Value::from),
            );
            attrs.insert("colspan".into(), cell.colspan.into());
            attrs.insert("rowspan".into(), cell.rowspan.into());
        }
        NodeKind::Image { src, width } => {
            attrs.insert("src".into(), src.clone().into());
            attrs.insert("width".into(), width.map_or(Value::Null, Value::from));
        }
        NodeKind::Doc
        | NodeKind::BulletList
        | NodeKind::ListItem
        | NodeKind::TaskList
        | NodeKind::Table
        | NodeKind::TableRow
        | NodeKind::HorizontalRule
        | NodeKind::Text { .. } => {}
    }

    let marks = if node.marks.is_empty() {
        None
    } else {
        Some(node.marks.iter().map(mark_to_json).collect())
    };

    PersistedDoc {
        kind: node.kind.name().to_string(),
        attrs,
        children: node.children.iter().map(|c| to_json(c)).collect(),
        text: node.text_value().map(str::to_string),
        marks,
    }
}

fn mark_to_json(mark: &Mark) -> PersistedMark {
    let mut attrs = Map::new();
    match mark {
        Mark::TextColor { color } | Mark::Highlight { color } => {
            attrs.insert("color".into(), color.clone().into());
        }
        Mark::FontFamily { name } => {
            attrs.insert("name".into(), name.clone().into());
        }
        Mark::FontSize { px } => {
            attrs.insert("px".into(), (*px).into());
        }
        Mark::LineHeight { value } => {
            attrs.insert("value".into(), value.clone().into());
        }
        Mark::Link { href } => {
            attrs.insert("href".into(), href.clone().into());
        }
        Mark::Bold
        | Mark::Italic
        | Mark::Underline
        | Mark::Strike
        | Mark::Superscript
        | Mark::Subscript => {}
    }
    PersistedMark {
        mark_type: mark.mark_type().name().to_string(),
        attrs,
    }
}

/// Hydrate and validate a persisted document
pub fn from_json(doc: &PersistedDoc) -> ModelResult<Node> {
    let root = node_from_json(doc)?;
    root.check().map_err(|e| match e {
        ModelError::InvalidStructure(reason) => ModelError::Serialization { reason },
        other => other,
    })?;
    Ok(root)
}

pub fn from_json_str(source: &str) -> ModelResult<Node> {
    let doc: PersistedDoc = serde_json::from_str(source)
        .map_err(|e| ModelError::serialization(format!("malformed JSON: {e}")))?;
    from_json(&doc)
}

pub fn to_json_string(node: &Node) -> String {
    // PersistedDoc holds only strings, numbers, bools and maps
    serde_json::to_string(&to_json(node)).unwrap_or_default()
}

fn node_from_json(doc: &PersistedDoc) -> ModelResult<Node> {
    let attrs = &doc.attrs;
    let kind = match doc.kind.as_str() {
        "doc" => NodeKind::Doc,
        "paragraph" => NodeKind::Paragraph {
            align: read_align(attrs)?,
        },
        "heading" => NodeKind::Heading {
            level: read_u32(attrs, "level")?.unwrap_or(1).min(u8::MAX as u32) as u8,
            align: read_align(attrs)?,
        },
        "bulletList" => NodeKind::BulletList,
        "orderedList" => NodeKind::OrderedList {
            start: read_u32(attrs, "start")?.unwrap_or(1),
        },
        "listItem" => NodeKind::ListItem,
        "taskList" => NodeKind::TaskList,
        "taskItem" => NodeKind::TaskItem {
            checked: read_bool(attrs, "checked")?.unwrap_or(false),
        },
        "table" => NodeKind::Table,
        "tableRow" => NodeKind::TableRow,
        "tableCell" => NodeKind::TableCell(read_cell(attrs)?),
        "tableHeaderCell" => NodeKind::TableHeaderCell(read_cell(attrs)?),
        "image" => NodeKind::Image {
            src: read_str(attrs, "src")?
                .ok_or_else(|| ModelError::serialization("image requires a src"))?
                .to_string(),
            width: read_u32(attrs, "width")?,
        },
        "horizontalRule" => NodeKind::HorizontalRule,
        "text" => NodeKind::Text {
            value: doc
                .text
                .clone()
                .ok_or_else(|| ModelError::serialization("text node without text"))?,
        },
        other => {
            return Err(ModelError::serialization(format!("unknown node kind '{other}'")));
        }
    };

    if !kind.is_text() {
        if doc.text.is_some() {
            return Err(ModelError::serialization(format!(
                "{} cannot carry text",
                kind.name()
            )));
        }
        if doc.marks.as_ref().map_or(false, |m| !m.is_empty()) {
            return Err(ModelError::serialization(format!(
                "{} cannot carry marks",
                kind.name()
            )));
        }
    }

    let mut marks = MarkSet::new();
    for mark in doc.marks.iter().flatten() {
        let mark = mark_from_json(mark)?;
        if marks.has_type(mark.mark_type()) {
            return Err(ModelError::serialization(format!(
                "duplicate {} mark",
                mark.mark_type().name()
            )));
        }
        marks.insert(mark);
    }

    let children = doc
        .children
        .iter()
        .map(|c| node_from_json(c).map(Arc::new))
        .collect::<ModelResult<Vec<NodeRef>>>()?;

    Ok(Node {
        kind,
        children,
        marks,
    })
}

fn mark_from_json(mark: &PersistedMark) -> ModelResult<Mark> {
    let mark_type = MarkType::from_name(&mark.mark_type).ok_or_else(|| {
        ModelError::serialization(format!("unknown mark type '{}'", mark.mark_type))
    })?;
    let attrs = &mark.attrs;
    let required = |key: &str| -> ModelResult<String> {
        read_str(attrs, key)?
            .map(str::to_string)
            .ok_or_else(|| ModelError::serialization(format!("{} mark requires {key}", mark.mark_type)))
    };
    Ok(match mark_type {
        MarkType::Bold => Mark::Bold,
        MarkType::Italic => Mark::Italic,
        MarkType::Underline => Mark::Underline,
        MarkType::Strike => Mark::Strike,
        MarkType::Superscript => Mark::Superscript,
        MarkType::Subscript => Mark::Subscript,
        MarkType::TextColor => Mark::TextColor {
            color: required("color")?,
        },
        MarkType::Highlight => Mark::Highlight {
            color: required("color")?,
        },
        MarkType::FontFamily => Mark::FontFamily {
            name: required("name")?,
        },
        MarkType::FontSize => Mark::FontSize {
            px: read_u32(attrs, "px")?
                .ok_or_else(|| ModelError::serialization("fontSize mark requires px"))?,
        },
        MarkType::LineHeight => Mark::LineHeight {
            value: required("value")?,
        },
        MarkType::Link => Mark::Link {
            href: required("href")?,
        },
    })
}

fn read_str<'a>(attrs: &'a Map<String, Value>, key: &str) -> ModelResult<Option<&'a str>> {
    match attrs.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(ModelError::serialization(format!(
            "attribute '{key}' must be a string, found {other}"
        ))),
    }
}

fn read_u32(attrs: &Map<String, Value>, key: &str) -> ModelResult<Option<u32>> {
    match attrs.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| {
                ModelError::serialization(format!(
                    "attribute '{key}' must be a non-negative integer, found {value}"
                ))
            }),
    }
}

fn read_bool(attrs: &Map<String, Value>, key: &str) -> ModelResult<Option<bool>> {
    match attrs.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(ModelError::serialization(format!(
            "attribute '{key}' must be a boolean, found {other}"
        ))),
    }
}

fn read_align(attrs: &Map<String, Value>) -> ModelResult<TextAlign> {
    match read_str(attrs, "textAlign")? {
        None => Ok(TextAlign::Left),
        Some(name) => TextAlign::from_name(name)
            .ok_or_else(|| ModelError::serialization(format!("unknown textAlign '{name}'"))),
    }
}

fn read_cell(attrs: &Map<String, Value>) -> ModelResult<CellAttrs> {
    Ok(CellAttrs {
        colspan: read_u32(attrs, "colspan")?.unwrap_or(1),
        rowspan: read_u32(attrs, "rowspan")?.unwrap_or(1),
        background_color: read_str(attrs, "backgroundColor")?.map(str::to_string),
    })
}
