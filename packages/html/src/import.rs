//! Best-effort HTML import.
//!
//! Pasted HTML comes from anywhere, so nothing here fails: unknown tags
//! become plain paragraphs holding their text, unknown styles are dropped and
//! broken structure (ragged tables, empty list items, bare inline content) is
//! repaired until the result passes [`Node::check`].

use crate::lexer::{parse_start_tag, parse_style, HtmlToken, StartTag};
use logos::Logos;
use nextnote_model::{
    is_valid_line_height, normalize_inline, CellAttrs, Mark, MarkSet, MarkType, Node, NodeKind, NodeRef, TableMap,
    TextAlign,
};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Element or text in the loose tree built from the token stream
#[derive(Debug, Clone)]
enum Dom {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Element {
    tag: StartTag,
    children: Vec<Dom>,
}

impl Element {
    fn name(&self) -> &str {
        &self.tag.name
    }

    fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                Dom::Text(text) => out.push_str(text),
                Dom::Element(el) => out.push_str(&el.text_content()),
            }
        }
        out
    }

    fn style(&self) -> Vec<(String, String)> {
        self.tag.attr("style").map(parse_style).unwrap_or_default()
    }

    fn style_value(&self, property: &str) -> Option<String> {
        self.style()
            .into_iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v)
    }
}

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const DROPPED_TAGS: &[&str] = &[
    "head", "style", "script", "title", "meta", "link", "template", "noscript", "iframe",
    "object", "svg", "button", "select", "textarea", "colgroup", "caption",
];

const TRANSPARENT_TAGS: &[&str] = &[
    "html", "body", "div", "section", "article", "main", "header", "footer", "nav", "aside",
    "figure", "figcaption", "blockquote", "center", "form", "fieldset", "details", "summary",
    "thead", "tbody", "tfoot", "tr", "td", "th", "dl", "dd", "dt",
];

const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "big", "br", "cite", "code", "data", "del", "dfn", "em",
    "font", "i", "img", "input", "ins", "kbd", "label", "mark", "q", "s", "samp", "small",
    "span", "strike", "strong", "sub", "sup", "time", "tt", "u", "var", "wbr",
];

const BLOCK_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "table", "hr", "div", "pre",
    "blockquote", "section", "article", "header", "footer", "nav", "aside", "figure", "form",
];

/// Import an HTML fragment or page as a document
#[instrument(skip_all, fields(len = source.len()))]
pub fn parse_html(source: &str) -> Node {
    let dom = build_dom(source);
    let mut importer = Importer::default();
    let mut blocks = importer.blocks(&dom);
    if blocks.is_empty() {
        blocks.push(Node::paragraph(vec![]));
    }

    let doc = Node::doc(blocks);
    if let Err(err) = doc.check() {
        warn!(error = %err, "imported html failed validation, keeping text only");
        return text_to_doc(&doc.text_between(0, doc.content_size(), "\n"));
    }
    debug!(
        blocks = doc.child_count(),
        repairs = importer.repairs,
        "imported html"
    );
    doc
}

/// One paragraph per line of plain text
pub fn text_to_doc(text: &str) -> Node {
    let paragraphs: Vec<Node> = text
        .lines()
        .map(|line| Node::paragraph_text(&line.replace('\t', " ")))
        .collect();
    if paragraphs.is_empty() {
        Node::empty_doc()
    } else {
        Node::doc(paragraphs)
    }
}

fn build_dom(source: &str) -> Vec<Dom> {
    let mut stack = vec![Element {
        tag: StartTag {
            name: String::new(),
            attrs: Vec::new(),
            self_closing: false,
        },
        children: Vec::new(),
    }];

    let mut lexer = HtmlToken::lexer(source);
    while let Some(token) = lexer.next() {
        match token {
            Ok(HtmlToken::OpenTag(raw)) => {
                let tag = parse_start_tag(raw);
                close_implied(&mut stack, &tag.name);
                if matches!(tag.name.as_str(), "script" | "style") {
                    // raw text: skip straight to the closing tag
                    let close = format!("</{}", tag.name);
                    let skip = lexer
                        .remainder()
                        .to_ascii_lowercase()
                        .find(&close)
                        .unwrap_or(lexer.remainder().len());
                    lexer.bump(skip);
                    continue;
                }
                let element = Element {
                    tag,
                    children: Vec::new(),
                };
                if element.tag.self_closing || VOID_TAGS.contains(&element.name()) {
                    push_child(&mut stack, Dom::Element(element));
                } else {
                    stack.push(element);
                }
            }
            Ok(HtmlToken::CloseTag(name)) => {
                let name = name.to_ascii_lowercase();
                if let Some(depth) = stack.iter().rposition(|e| e.tag.name == name) {
                    if depth > 0 {
                        while stack.len() > depth {
                            pop_element(&mut stack);
                        }
                    }
                }
            }
            Ok(HtmlToken::Text(text)) => {
                let decoded = html_escape::decode_html_entities(text).into_owned();
                push_child(&mut stack, Dom::Text(decoded));
            }
            Ok(HtmlToken::StrayAngle) | Err(()) => {
                push_child(&mut stack, Dom::Text(lexer.slice().to_string()));
            }
            Ok(HtmlToken::Comment) | Ok(HtmlToken::Declaration) => {}
        }
    }

    while stack.len() > 1 {
        pop_element(&mut stack);
    }
    stack.pop().map(|root| root.children).unwrap_or_default()
}

fn push_child(stack: &mut [Element], child: Dom) {
    if let Some(top) = stack.last_mut() {
        top.children.push(child);
    }
}

fn pop_element(stack: &mut Vec<Element>) {
    if let Some(element) = stack.pop() {
        push_child(stack, Dom::Element(element));
    }
}

/// Close elements that HTML closes implicitly when `name` opens
fn close_implied(stack: &mut Vec<Element>, name: &str) {
    if BLOCK_TAGS.contains(&name) && stack.last().map_or(false, |e| e.name() == "p") {
        pop_element(stack);
    }
    match name {
        "li" => close_open(stack, &["li"], &["ul", "ol"]),
        "tr" => close_open(stack, &["tr"], &["table"]),
        "td" | "th" => close_open(stack, &["td", "th"], &["tr", "table"]),
        _ => {}
    }
}

/// Pop up to and including the innermost `target` unless a `boundary`
/// element is open inside it
fn close_open(stack: &mut Vec<Element>, target: &[&str], boundary: &[&str]) {
    let found = stack
        .iter()
        .rposition(|e| target.contains(&e.name()) || boundary.contains(&e.name()));
    if let Some(depth) = found {
        if depth > 0 && target.contains(&stack[depth].name()) {
            while stack.len() > depth {
                pop_element(stack);
            }
        }
    }
}

#[derive(Default)]
struct Importer {
    repairs: usize,
}

impl Importer {
    /// Convert the content of a block container
    fn blocks(&mut self, nodes: &[Dom]) -> Vec<Node> {
        let mut out = Vec::new();
        let mut inline = Vec::new();
        let paragraph = NodeKind::paragraph();
        self.collect(nodes, &MarkSet::new(), &paragraph, &mut out, &mut inline);
        flush(&mut inline, &paragraph, &mut out);
        out
    }

    /// Walk mixed content: inline runs gather into `inline` until a block
    /// interrupts them, at which point they become a `textblock` node.
    fn collect(
        &mut self,
        nodes: &[Dom],
        marks: &MarkSet,
        textblock: &NodeKind,
        out: &mut Vec<Node>,
        inline: &mut Vec<NodeRef>,
    ) {
        for dom in nodes {
            match dom {
                Dom::Text(text) => {
                    let text = collapse_whitespace(text);
                    if !text.is_empty() {
                        inline.push(Arc::new(Node::text(text, marks.clone())));
                    }
                }
                Dom::Element(el) if INLINE_TAGS.contains(&el.name()) => match el.name() {
                    "br" => inline.push(Arc::new(Node::text(" ", marks.clone()))),
                    "img" => {
                        flush(inline, textblock, out);
                        if let Some(image) = image(el) {
                            out.push(image);
                        }
                    }
                    "input" | "wbr" => {}
                    _ => {
                        let marks = element_marks(el, marks);
                        self.collect(&el.children, &marks, textblock, out, inline);
                    }
                },
                Dom::Element(el) => {
                    flush(inline, textblock, out);
                    self.block(el, out);
                }
            }
        }
    }

    fn block(&mut self, el: &Element, out: &mut Vec<Node>) {
        let name = el.name();
        match name {
            "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let align = el
                    .style_value("text-align")
                    .and_then(|v| TextAlign::from_name(&v.to_ascii_lowercase()))
                    .unwrap_or_default();
                let kind = match name.strip_prefix('h').and_then(|n| n.parse::<u8>().ok()) {
                    Some(level) => NodeKind::Heading {
                        level: level.clamp(1, 4),
                        align,
                    },
                    None => NodeKind::Paragraph { align },
                };
                let before = out.len();
                let mut inline = Vec::new();
                self.collect(&el.children, &MarkSet::new(), &kind, out, &mut inline);
                flush(&mut inline, &kind, out);
                if out.len() == before {
                    out.push(Node::leaf(kind));
                }
            }
            "ul" | "ol" => {
                if let Some(list) = self.list(el) {
                    out.push(list);
                }
            }
            "li" => {
                let item = self.item(el, false);
                out.push(Node::new(NodeKind::BulletList, vec![item]));
            }
            "table" => {
                if let Some(table) = self.table(el) {
                    out.push(table);
                }
            }
            "hr" => out.push(Node::horizontal_rule()),
            _ if DROPPED_TAGS.contains(&name) => {}
            _ if TRANSPARENT_TAGS.contains(&name) => out.extend(self.blocks(&el.children)),
            _ => {
                let text = collapse_whitespace(&el.text_content());
                let text = trim_ascii(&text);
                if !text.is_empty() {
                    self.repairs += 1;
                    out.push(Node::paragraph_text(text));
                }
            }
        }
    }

    fn list(&mut self, el: &Element) -> Option<Node> {
        let task = el.tag.attr("data-type") == Some("taskList");
        let kind = if task {
            NodeKind::TaskList
        } else if el.name() == "ol" {
            let start = el
                .tag
                .attr("start")
                .and_then(|s| s.trim().parse::<u32>().ok())
                .unwrap_or(1);
            NodeKind::OrderedList { start }
        } else {
            NodeKind::BulletList
        };

        let mut items: Vec<Node> = Vec::new();
        for child in &el.children {
            match child {
                Dom::Element(li) if li.name() == "li" => items.push(self.item(li, task)),
                other => {
                    // stray content (often a nested list) joins the previous item
                    let blocks = self.blocks(std::slice::from_ref(other));
                    if blocks.is_empty() {
                        continue;
                    }
                    self.repairs += 1;
                    match items.last_mut() {
                        Some(item) => item.children.extend(blocks.into_iter().map(Arc::new)),
                        None => items.push(Node::new(item_kind(task, false), blocks)),
                    }
                }
            }
        }

        if items.is_empty() {
            self.repairs += 1;
            return None;
        }
        Some(Node::new(kind, items))
    }

    fn item(&mut self, li: &Element, task: bool) -> Node {
        let checked = task && (li.tag.attr("data-checked") == Some("true") || has_checked_box(li));
        let mut blocks = self.blocks(&li.children);
        if blocks.is_empty() {
            blocks.push(Node::paragraph(vec![]));
        }
        Node::new(item_kind(task, checked), blocks)
    }

    fn table(&mut self, el: &Element) -> Option<Node> {
        let mut rows = Vec::new();
        self.collect_rows(&el.children, &mut rows);
        let table = self.repair_table(rows);
        if table.is_none() {
            self.repairs += 1;
        }
        table
    }

    fn collect_rows(&mut self, nodes: &[Dom], rows: &mut Vec<Vec<Node>>) {
        for dom in nodes {
            let Dom::Element(el) = dom else {
                continue;
            };
            match el.name() {
                "tr" => {
                    let cells = el
                        .children
                        .iter()
                        .filter_map(|c| match c {
                            Dom::Element(cell) if matches!(cell.name(), "td" | "th") => {
                                Some(self.cell(cell))
                            }
                            _ => None,
                        })
                        .collect();
                    rows.push(cells);
                }
                "thead" | "tbody" | "tfoot" => self.collect_rows(&el.children, rows),
                "td" | "th" => {
                    // cell without a row
                    self.repairs += 1;
                    let cell = self.cell(el);
                    match rows.last_mut() {
                        Some(row) => row.push(cell),
                        None => rows.push(vec![cell]),
                    }
                }
                _ => {}
            }
        }
    }

    fn cell(&mut self, el: &Element) -> Node {
        let span = |name: &str| {
            el.tag
                .attr(name)
                .and_then(|v| v.trim().parse::<u32>().ok())
                .filter(|&n| n > 0)
                .unwrap_or(1)
        };
        let background_color = el
            .style_value("background-color")
            .or_else(|| el.tag.attr("bgcolor").map(str::to_string))
            .filter(|c| !c.is_empty());
        let attrs = CellAttrs {
            colspan: span("colspan"),
            rowspan: span("rowspan"),
            background_color,
        };

        let mut blocks = self.blocks(&el.children);
        if blocks.is_empty() {
            blocks.push(Node::paragraph(vec![]));
        }
        let kind = if el.name() == "th" {
            NodeKind::TableHeaderCell(attrs)
        } else {
            NodeKind::TableCell(attrs)
        };
        Node::new(kind, blocks)
    }

    /// Clamp spans and pad short rows until the table is rectangular
    fn repair_table(&mut self, mut rows: Vec<Vec<Node>>) -> Option<Node> {
        rows.retain(|row| !row.is_empty());
        if rows.is_empty() {
            return None;
        }

        let height = rows.len();
        let mut taken: Vec<Vec<bool>> = vec![Vec::new(); height];
        for (r, row) in rows.iter_mut().enumerate() {
            let mut col = 0;
            for cell in row.iter_mut() {
                while taken[r].get(col).copied().unwrap_or(false) {
                    col += 1;
                }
                let Some(attrs) = cell.kind.cell_attrs_mut() else {
                    continue;
                };
                let max_rowspan = (height - r) as u32;
                if attrs.rowspan > max_rowspan {
                    attrs.rowspan = max_rowspan;
                    self.repairs += 1;
                }
                let mut colspan = 0;
                while colspan < attrs.colspan as usize
                    && !taken[r].get(col + colspan).copied().unwrap_or(false)
                {
                    colspan += 1;
                }
                if colspan as u32 != attrs.colspan {
                    attrs.colspan = colspan as u32;
                    self.repairs += 1;
                }
                for line in &mut taken[r..r + attrs.rowspan as usize] {
                    if line.len() < col + colspan {
                        line.resize(col + colspan, false);
                    }
                    for slot in &mut line[col..col + colspan] {
                        *slot = true;
                    }
                }
                col += colspan;
            }
        }

        let width = taken.iter().map(Vec::len).max().unwrap_or(0);
        for (r, row) in rows.iter_mut().enumerate() {
            let missing = width - taken[r].iter().filter(|&&t| t).count();
            if missing > 0 {
                let header = row
                    .iter()
                    .all(|c| matches!(c.kind, NodeKind::TableHeaderCell(_)));
                debug!(row = r, missing, "padding short table row");
                self.repairs += 1;
                row.extend((0..missing).map(|_| Node::empty_cell(header, CellAttrs::default())));
            }
        }

        let table = Node::table(rows.into_iter().map(Node::table_row).collect());
        match TableMap::build(&table) {
            Ok(_) => Some(table),
            Err(err) => {
                warn!(error = %err, "could not repair table spans, flattening");
                Some(flatten_table(&table))
            }
        }
    }
}

fn item_kind(task: bool, checked: bool) -> NodeKind {
    if task {
        NodeKind::TaskItem { checked }
    } else {
        NodeKind::ListItem
    }
}

fn has_checked_box(el: &Element) -> bool {
    el.children.iter().any(|child| match child {
        Dom::Element(input) if input.name() == "input" => {
            input.tag.attr("type") == Some("checkbox") && input.tag.attr("checked").is_some()
        }
        Dom::Element(label) if label.name() == "label" => has_checked_box(label),
        _ => false,
    })
}

/// Drop every span and pad rows to the widest one
fn flatten_table(table: &Node) -> Node {
    let width = table.children.iter().map(|r| r.children.len()).max().unwrap_or(1);
    let rows = table
        .children
        .iter()
        .map(|row| {
            let mut cells: Vec<Node> = row
                .children
                .iter()
                .map(|cell| {
                    let mut cell = (**cell).clone();
                    if let Some(attrs) = cell.kind.cell_attrs_mut() {
                        attrs.colspan = 1;
                        attrs.rowspan = 1;
                    }
                    cell
                })
                .collect();
            while cells.len() < width {
                cells.push(Node::empty_cell(false, CellAttrs::default()));
            }
            Node::table_row(cells)
        })
        .collect();
    Node::table(rows)
}

fn image(el: &Element) -> Option<Node> {
    let src = el.tag.attr("src").map(str::trim).filter(|s| !s.is_empty())?;
    let width = el
        .tag
        .attr("width")
        .map(|w| w.trim().trim_end_matches("px"))
        .and_then(|w| w.parse::<u32>().ok())
        .filter(|&w| w > 0);
    Some(Node::image(src, width))
}

/// Marks contributed by an inline element on top of the inherited ones
fn element_marks(el: &Element, inherited: &MarkSet) -> MarkSet {
    let mut marks = inherited.clone();
    match el.name() {
        "strong" | "b" => marks.insert(Mark::Bold),
        "em" | "i" => marks.insert(Mark::Italic),
        "u" | "ins" => marks.insert(Mark::Underline),
        "s" | "strike" | "del" => marks.insert(Mark::Strike),
        "sup" => marks.insert(Mark::Superscript),
        "sub" => marks.insert(Mark::Subscript),
        "mark" => {
            let color = el
                .tag
                .attr("data-color")
                .filter(|c| !c.is_empty())
                .unwrap_or("yellow");
            marks.insert(Mark::Highlight {
                color: color.to_string(),
            });
        }
        "a" => {
            if let Some(href) = el.tag.attr("href").map(str::trim).filter(|h| !h.is_empty()) {
                marks.insert(Mark::Link {
                    href: href.to_string(),
                });
            }
        }
        "font" => {
            if let Some(color) = el.tag.attr("color") {
                marks.insert(Mark::TextColor {
                    color: color.to_string(),
                });
            }
            if let Some(face) = el.tag.attr("face") {
                marks.insert(Mark::FontFamily {
                    name: face.to_string(),
                });
            }
        }
        _ => {}
    }

    for (property, value) in el.style() {
        let lower = value.to_ascii_lowercase();
        match property.as_str() {
            "color" => marks.insert(Mark::TextColor { color: value }),
            "background-color" => marks.insert(Mark::Highlight { color: value }),
            "font-family" => marks.insert(Mark::FontFamily { name: value }),
            "font-size" => {
                if let Some(px) = parse_px(&lower) {
                    marks.insert(Mark::FontSize { px });
                }
            }
            "line-height" if is_valid_line_height(&lower) => {
                marks.insert(Mark::LineHeight { value: lower })
            }
            "font-weight" => match lower.as_str() {
                "bold" | "bolder" | "600" | "700" | "800" | "900" => marks.insert(Mark::Bold),
                "normal" | "400" | "lighter" => {
                    marks.remove(MarkType::Bold);
                }
                _ => {}
            },
            "font-style" if lower == "italic" => marks.insert(Mark::Italic),
            "text-decoration" | "text-decoration-line" => {
                if lower.contains("underline") {
                    marks.insert(Mark::Underline);
                }
                if lower.contains("line-through") {
                    marks.insert(Mark::Strike);
                }
            }
            "vertical-align" => match lower.as_str() {
                "super" => marks.insert(Mark::Superscript),
                "sub" => marks.insert(Mark::Subscript),
                _ => {}
            },
            _ => {}
        }
    }
    marks
}

fn parse_px(value: &str) -> Option<u32> {
    let number: f32 = value.strip_suffix("px")?.trim().parse().ok()?;
    let px = number.round();
    (px >= 1.0).then_some(px as u32)
}

/// Whitespace runs that contain a line break or tab become one space
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = String::new();
    let mut soft = false;
    for c in text.chars() {
        if matches!(c, ' ' | '\n' | '\r' | '\t' | '\x0c') {
            soft |= c != ' ';
            run.push(c);
            continue;
        }
        if !run.is_empty() {
            out.push_str(if soft { " " } else { &run });
            run.clear();
            soft = false;
        }
        out.push(c);
    }
    if !run.is_empty() {
        out.push_str(if soft { " " } else { &run });
    }
    out
}

fn trim_ascii(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_ascii_whitespace())
}

/// Turn the gathered inline runs into a textblock of `kind`
fn flush(inline: &mut Vec<NodeRef>, kind: &NodeKind, out: &mut Vec<Node>) {
    if inline.is_empty() {
        return;
    }
    let mut children = normalize_inline(std::mem::take(inline));
    if let Some(first) = children.first_mut() {
        trim_text(first, |s| s.trim_start_matches(|c: char| c.is_ascii_whitespace()));
    }
    if let Some(last) = children.last_mut() {
        trim_text(last, |s| s.trim_end_matches(|c: char| c.is_ascii_whitespace()));
    }
    let children = normalize_inline(children);
    if !children.is_empty() {
        out.push(Node::from_refs(kind.clone(), children));
    }
}

fn trim_text(node: &mut NodeRef, trim: impl Fn(&str) -> &str) {
    let Some(value) = node.text_value() else {
        return;
    };
    let trimmed = trim(value);
    if trimmed.len() != value.len() {
        let trimmed = trimmed.to_string();
        if let NodeKind::Text { value } = &mut Arc::make_mut(node).kind {
            *value = trimmed;
        }
    }
}
