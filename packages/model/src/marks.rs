//! Inline style annotations carried by text runs.
//!
//! A [`MarkSet`] holds at most one mark per [`MarkType`] and keeps its marks in
//! rank order, which is also the nesting order used by the HTML exporter.

use serde::{Deserialize, Serialize};

/// A style applied to a run of text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strike,
    Superscript,
    Subscript,
    TextColor { color: String },
    Highlight { color: String },
    FontFamily { name: String },
    FontSize { px: u32 },
    /// CSS line height, e.g. `1.5` or `24px`
    LineHeight { value: String },
    Link { href: String },
}

/// Mark variant tag, ordered by rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkType {
    Bold,
    Italic,
    Underline,
    Strike,
    Superscript,
    Subscript,
    TextColor,
    Highlight,
    FontFamily,
    FontSize,
    LineHeight,
    Link,
}

impl MarkType {
    pub const ALL: [MarkType; 12] = [
        MarkType::Bold,
        MarkType::Italic,
        MarkType::Underline,
        MarkType::Strike,
        MarkType::Superscript,
        MarkType::Subscript,
        MarkType::TextColor,
        MarkType::Highlight,
        MarkType::FontFamily,
        MarkType::FontSize,
        MarkType::LineHeight,
        MarkType::Link,
    ];

    /// Name used in the persisted format
    pub fn name(self) -> &'static str {
        match self {
            MarkType::Bold => "bold",
            MarkType::Italic => "italic",
            MarkType::Underline => "underline",
            MarkType::Strike => "strike",
            MarkType::Superscript => "superscript",
            MarkType::Subscript => "subscript",
            MarkType::TextColor => "textColor",
            MarkType::Highlight => "highlight",
            MarkType::FontFamily => "fontFamily",
            MarkType::FontSize => "fontSize",
            MarkType::LineHeight => "lineHeight",
            MarkType::Link => "link",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Types that cannot coexist with this one on the same run
    pub fn excludes(self) -> Option<MarkType> {
        match self {
            MarkType::Superscript => Some(MarkType::Subscript),
            MarkType::Subscript => Some(MarkType::Superscript),
            _ => None,
        }
    }

    /// Whether text typed at the end of a run keeps this mark
    pub fn inclusive(self) -> bool {
        !matches!(self, MarkType::Link)
    }
}

impl Mark {
    pub fn mark_type(&self) -> MarkType {
        match self {
            Mark::Bold => MarkType::Bold,
            Mark::Italic => MarkType::Italic,
            Mark::Underline => MarkType::Underline,
            Mark::Strike => MarkType::Strike,
            Mark::Superscript => MarkType::Superscript,
            Mark::Subscript => MarkType::Subscript,
            Mark::TextColor { .. } => MarkType::TextColor,
            Mark::Highlight { .. } => MarkType::Highlight,
            Mark::FontFamily { .. } => MarkType::FontFamily,
            Mark::FontSize { .. } => MarkType::FontSize,
            Mark::LineHeight { .. } => MarkType::LineHeight,
            Mark::Link { .. } => MarkType::Link,
        }
    }
}

/// Whether `value` is a line height the exporter can write: `normal`, a
/// positive number, or a positive length in px, em, rem or percent
pub fn is_valid_line_height(value: &str) -> bool {
    let value = value.trim();
    if value == "normal" {
        return true;
    }
    let number = ["px", "rem", "em", "%"]
        .iter()
        .find_map(|unit| value.strip_suffix(unit))
        .unwrap_or(value);
    number
        .trim()
        .parse::<f32>()
        .map_or(false, |n| n.is_finite() && n > 0.0)
}

/// Set of marks keyed by variant
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MarkSet {
    marks: Vec<Mark>,
}

impl MarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_marks(marks: impl IntoIterator<Item = Mark>) -> Self {
        let mut set = Self::new();
        for mark in marks {
            set.insert(mark);
        }
        set
    }

    /// Add a mark, replacing any mark of the same variant
    pub fn insert(&mut self, mark: Mark) {
        let mark_type = mark.mark_type();
        if let Some(excluded) = mark_type.excludes() {
            self.remove(excluded);
        }
        match self
            .marks
            .binary_search_by(|m| m.mark_type().cmp(&mark_type))
        {
            Ok(index) => self.marks[index] = mark,
            Err(index) => self.marks.insert(index, mark),
        }
    }

    pub fn remove(&mut self, mark_type: MarkType) -> Option<Mark> {
        let index = self.marks.iter().position(|m| m.mark_type() == mark_type)?;
        Some(self.marks.remove(index))
    }

    pub fn get(&self, mark_type: MarkType) -> Option<&Mark> {
        self.marks.iter().find(|m| m.mark_type() == mark_type)
    }

    pub fn has_type(&self, mark_type: MarkType) -> bool {
        self.get(mark_type).is_some()
    }

    /// Exact match, including attributes
    pub fn contains(&self, mark: &Mark) -> bool {
        self.get(mark.mark_type()) == Some(mark)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mark> {
        self.marks.iter()
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

impl FromIterator<Mark> for MarkSet {
    fn from_iter<I: IntoIterator<Item = Mark>>(iter: I) -> Self {
        Self::from_marks(iter)
    }
}

impl<'a> IntoIterator for &'a MarkSet {
    type Item = &'a Mark;
    type IntoIter = std::slice::Iter<'a, Mark>;

    fn into_iter(self) -> Self::IntoIter {
        self.marks.iter()
    }
}
