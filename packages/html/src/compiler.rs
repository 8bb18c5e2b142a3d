use nextnote_model::{Mark, MarkType, Node, NodeKind, TextAlign};
use tracing::instrument;

/// Options for HTML export
#[derive(Debug, Clone)]
pub struct HtmlOptions {
    /// Put every block on its own line
    pub pretty: bool,
    /// Indentation string used when pretty printing
    pub indent: String,
    /// Wrap the output in a complete HTML page
    pub standalone: bool,
    /// Page title when `standalone` is set
    pub title: Option<String>,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            pretty: false,
            indent: "  ".to_string(),
            standalone: false,
            title: None,
        }
    }
}

impl HtmlOptions {
    pub fn pretty() -> Self {
        Self {
            pretty: true,
            ..Self::default()
        }
    }
}

struct Context {
    options: HtmlOptions,
    depth: usize,
    buffer: String,
}

impl Context {
    fn new(options: HtmlOptions) -> Self {
        Self {
            options,
            depth: 0,
            buffer: String::new(),
        }
    }

    fn add(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn add_line(&mut self, text: &str) {
        if self.options.pretty {
            for _ in 0..self.depth {
                self.buffer.push_str(&self.options.indent);
            }
        }
        self.add(text);
        if self.options.pretty {
            self.add("\n");
        }
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        if self.depth > 0 {
            self.depth -= 1;
        }
    }

    fn get_output(self) -> String {
        self.buffer
    }
}

/// Export a node (usually a whole document) to HTML. The output depends only
/// on the tree and the options, so exporting the same tree twice yields the
/// same bytes.
#[instrument(skip_all, fields(size = node.content_size()))]
pub fn compile_to_html(node: &Node, options: HtmlOptions) -> String {
    let mut ctx = Context::new(options);

    if ctx.options.standalone {
        ctx.add_line("<!DOCTYPE html>");
        ctx.add_line("<html>");
        ctx.indent();
        ctx.add_line("<head>");
        ctx.indent();
        ctx.add_line("<meta charset=\"utf-8\">");
        if let Some(title) = ctx.options.title.clone() {
            ctx.add_line(&format!("<title>{}</title>", html_escape::encode_text(&title)));
        }
        ctx.dedent();
        ctx.add_line("</head>");
        ctx.add_line("<body>");
        ctx.indent();
    }

    compile_node(node, &mut ctx);

    if ctx.options.standalone {
        ctx.dedent();
        ctx.add_line("</body>");
        ctx.dedent();
        ctx.add_line("</html>");
    }

    ctx.get_output()
}

fn compile_node(node: &Node, ctx: &mut Context) {
    match &node.kind {
        NodeKind::Doc => compile_children(node, ctx),
        NodeKind::Paragraph { align } => {
            let open = format!("<p{}>", align_attr(*align));
            compile_textblock(node, &open, "</p>", ctx);
        }
        NodeKind::Heading { level, align } => {
            let open = format!("<h{level}{}>", align_attr(*align));
            compile_textblock(node, &open, &format!("</h{level}>"), ctx);
        }
        NodeKind::BulletList => compile_wrapped(node, "<ul>", "</ul>", ctx),
        NodeKind::OrderedList { start } => {
            let open = if *start == 1 {
                "<ol>".to_string()
            } else {
                format!("<ol start=\"{start}\">")
            };
            compile_wrapped(node, &open, "</ol>", ctx);
        }
        NodeKind::TaskList => compile_wrapped(node, "<ul data-type=\"taskList\">", "</ul>", ctx),
        NodeKind::ListItem => compile_wrapped(node, "<li>", "</li>", ctx),
        NodeKind::TaskItem { checked } => {
            let open = format!("<li data-type=\"taskItem\" data-checked=\"{checked}\">");
            compile_wrapped(node, &open, "</li>", ctx);
        }
        NodeKind::Table => compile_wrapped(node, "<table>", "</table>", ctx),
        NodeKind::TableRow => compile_wrapped(node, "<tr>", "</tr>", ctx),
        NodeKind::TableCell(attrs) | NodeKind::TableHeaderCell(attrs) => {
            let tag = if matches!(node.kind, NodeKind::TableHeaderCell(_)) {
                "th"
            } else {
                "td"
            };
            let mut open = format!("<{tag}");
            if attrs.colspan != 1 {
                open.push_str(&format!(" colspan=\"{}\"", attrs.colspan));
            }
            if attrs.rowspan != 1 {
                open.push_str(&format!(" rowspan=\"{}\"", attrs.rowspan));
            }
            if let Some(color) = &attrs.background_color {
                open.push_str(&format!(
                    " style=\"background-color: {}\"",
                    html_escape::encode_double_quoted_attribute(color)
                ));
            }
            open.push('>');
            compile_wrapped(node, &open, &format!("</{tag}>"), ctx);
        }
        NodeKind::Image { src, width } => {
            let mut tag = format!(
                "<img src=\"{}\"",
                html_escape::encode_double_quoted_attribute(src)
            );
            if let Some(width) = width {
                tag.push_str(&format!(" width=\"{width}\""));
            }
            tag.push('>');
            ctx.add_line(&tag);
        }
        NodeKind::HorizontalRule => ctx.add_line("<hr>"),
        NodeKind::Text { .. } => {
            let mut out = String::new();
            compile_text(node, &mut out);
            ctx.add(&out);
        }
    }
}

fn compile_children(node: &Node, ctx: &mut Context) {
    for child in &node.children {
        compile_node(child, ctx);
    }
}

fn compile_wrapped(node: &Node, open: &str, close: &str, ctx: &mut Context) {
    ctx.add_line(open);
    ctx.indent();
    compile_children(node, ctx);
    ctx.dedent();
    ctx.add_line(close);
}

/// Textblocks keep their inline content on a single line
fn compile_textblock(node: &Node, open: &str, close: &str, ctx: &mut Context) {
    let mut line = String::from(open);
    for child in &node.children {
        compile_text(child, &mut line);
    }
    line.push_str(close);
    ctx.add_line(&line);
}

fn align_attr(align: TextAlign) -> String {
    if align == TextAlign::Left {
        String::new()
    } else {
        format!(" style=\"text-align: {}\"", align.name())
    }
}

/// One text run wrapped in its marks, outermost first
fn compile_text(node: &Node, out: &mut String) {
    let Some(value) = node.text_value() else {
        return;
    };

    let mut closers: Vec<&str> = Vec::new();
    for mark in node.marks.iter() {
        let (open, close) = match mark {
            Mark::Bold => ("<strong>", "</strong>"),
            Mark::Italic => ("<em>", "</em>"),
            Mark::Underline => ("<u>", "</u>"),
            Mark::Strike => ("<s>", "</s>"),
            Mark::Superscript => ("<sup>", "</sup>"),
            Mark::Subscript => ("<sub>", "</sub>"),
            _ => continue,
        };
        out.push_str(open);
        closers.push(close);
    }

    // color, font family, font size and line height share one span
    if node.marks.iter().any(|m| is_style_mark(m.mark_type())) {
        out.push_str(&style_span(node));
        closers.push("</span>");
    }
    if let Some(Mark::Highlight { color }) = node.marks.get(MarkType::Highlight) {
        let color = html_escape::encode_double_quoted_attribute(color);
        out.push_str(&format!(
            "<mark data-color=\"{color}\" style=\"background-color: {color}\">"
        ));
        closers.push("</mark>");
    }
    if let Some(Mark::Link { href }) = node.marks.get(MarkType::Link) {
        out.push_str(&format!(
            "<a href=\"{}\">",
            html_escape::encode_double_quoted_attribute(href)
        ));
        closers.push("</a>");
    }

    out.push_str(&html_escape::encode_text(value));
    for close in closers.into_iter().rev() {
        out.push_str(close);
    }
}

fn is_style_mark(mark_type: MarkType) -> bool {
    matches!(
        mark_type,
        MarkType::TextColor | MarkType::FontFamily | MarkType::FontSize | MarkType::LineHeight
    )
}

fn style_span(node: &Node) -> String {
    let mut declarations = Vec::new();
    for mark in node.marks.iter() {
        match mark {
            Mark::TextColor { color } => declarations.push(format!("color: {color}")),
            Mark::FontFamily { name } => declarations.push(format!("font-family: {name}")),
            Mark::FontSize { px } => declarations.push(format!("font-size: {px}px")),
            Mark::LineHeight { value } => declarations.push(format!("line-height: {value}")),
            _ => {}
        }
    }
    format!(
        "<span style=\"{}\">",
        html_escape::encode_double_quoted_attribute(&declarations.join("; "))
    )
}
