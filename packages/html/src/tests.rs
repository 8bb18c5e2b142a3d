use crate::{compile_to_html, parse_html, text_to_doc, HtmlOptions};
use nextnote_model::{empty_table, Mark, MarkType, Node, NodeKind, TableMap, TextAlign};

fn html(node: &Node) -> String {
    compile_to_html(node, HtmlOptions::default())
}

#[test]
fn test_export_blocks() {
    let mut centered = Node::paragraph_text("mid");
    centered.kind.set_align(TextAlign::Center);
    let doc = Node::doc(vec![
        Node::heading(2, vec![Node::plain_text("Title")]),
        centered,
        Node::bullet_list(vec![Node::list_item(vec![Node::paragraph_text("a")])]),
        Node::image("cat.png", Some(120)),
        Node::horizontal_rule(),
    ]);

    assert_eq!(
        html(&doc),
        "<h2>Title</h2><p style=\"text-align: center\">mid</p><ul><li><p>a</p></li></ul>\
         <img src=\"cat.png\" width=\"120\"><hr>"
    );
}

#[test]
fn test_export_task_list_and_ordered_start() {
    let doc = Node::doc(vec![
        Node::task_list(vec![Node::task_item(true, vec![Node::paragraph_text("done")])]),
        Node::new(
            NodeKind::OrderedList { start: 4 },
            vec![Node::list_item(vec![Node::paragraph_text("four")])],
        ),
    ]);

    let out = html(&doc);
    assert!(out.contains("<ul data-type=\"taskList\"><li data-type=\"taskItem\" data-checked=\"true\">"));
    assert!(out.contains("<ol start=\"4\">"));
}

#[test]
fn test_export_table() {
    let doc = Node::doc(vec![empty_table(2, 2, true)]);
    assert_eq!(
        html(&doc),
        "<table><tr><th><p></p></th><th><p></p></th></tr><tr><td><p></p></td><td><p></p></td></tr></table>"
    );
}

#[test]
fn test_marks_nest_in_fixed_order() {
    let doc = Node::doc(vec![Node::paragraph(vec![Node::marked_text(
        "x",
        [
            Mark::Link {
                href: "https://a.example".to_string(),
            },
            Mark::TextColor {
                color: "red".to_string(),
            },
            Mark::Italic,
            Mark::Bold,
            Mark::Highlight {
                color: "#ff0".to_string(),
            },
            Mark::FontSize { px: 14 },
        ],
    )])]);

    assert_eq!(
        html(&doc),
        "<p><strong><em><span style=\"color: red; font-size: 14px\">\
         <mark data-color=\"#ff0\" style=\"background-color: #ff0\">\
         <a href=\"https://a.example\">x</a></mark></span></em></strong></p>"
    );
}

#[test]
fn test_export_escapes_text() {
    let doc = Node::doc(vec![Node::paragraph_text("a < b & c")]);
    assert_eq!(html(&doc), "<p>a &lt; b &amp; c</p>");
}

#[test]
fn test_export_is_deterministic() {
    let doc = Node::doc(vec![Node::paragraph(vec![
        Node::marked_text("bold", [Mark::Bold]),
        Node::plain_text(" rest"),
    ])]);
    assert_eq!(html(&doc), html(&doc));
}

#[test]
fn test_pretty_and_standalone() {
    let doc = Node::doc(vec![Node::bullet_list(vec![Node::list_item(vec![
        Node::paragraph_text("a"),
    ])])]);
    let options = HtmlOptions {
        standalone: true,
        title: Some("Note".to_string()),
        ..HtmlOptions::pretty()
    };
    let out = compile_to_html(&doc, options);

    println!("Generated HTML:\n{}", out);

    assert!(out.starts_with("<!DOCTYPE html>\n"));
    assert!(out.contains("    <title>Note</title>\n"));
    assert!(out.contains("    <ul>\n      <li>\n        <p>a</p>\n      </li>\n    </ul>\n"));
}

#[test]
fn test_import_basic_marks() {
    let doc = parse_html("<p>say <b>hello</b> <i>there</i></p>");
    let paragraph = doc.child(0);

    assert_eq!(paragraph.text_content(), "say hello there");
    assert!(paragraph.child(1).marks.has_type(MarkType::Bold));
    assert!(paragraph.child(3).marks.has_type(MarkType::Italic));
    assert!(doc.check().is_ok());
}

#[test]
fn test_import_unknown_tags_become_paragraphs() {
    let doc = parse_html("<custom-widget>keep <x-b>me</x-b></custom-widget><pre>code</pre>");
    let texts: Vec<String> = doc.children.iter().map(|c| c.text_content()).collect();
    assert_eq!(texts, vec!["keep me", "code"]);
    assert!(doc.children.iter().all(|c| c.is_textblock()));
}

#[test]
fn test_import_drops_unknown_styles() {
    let doc = parse_html(r#"<p><span style="color: blue; letter-spacing: 2px">x</span></p>"#);
    let text = doc.child(0).child(0);
    assert_eq!(text.marks.len(), 1);
    assert!(text.marks.contains(&Mark::TextColor {
        color: "blue".to_string()
    }));
}

#[test]
fn test_line_height_shares_style_span() {
    let doc = Node::doc(vec![Node::paragraph(vec![Node::marked_text(
        "tall",
        [
            Mark::LineHeight {
                value: "1.5".to_string(),
            },
            Mark::FontSize { px: 18 },
        ],
    )])]);

    let out = html(&doc);
    assert_eq!(
        out,
        "<p><span style=\"font-size: 18px; line-height: 1.5\">tall</span></p>"
    );
    let text = parse_html(&out).child(0).child(0).clone();
    assert!(text.marks.contains(&Mark::LineHeight {
        value: "1.5".to_string()
    }));
    assert!(text.marks.contains(&Mark::FontSize { px: 18 }));
}

#[test]
fn test_import_ignores_bad_line_height() {
    let doc = parse_html(r#"<p><span style="line-height: -2">x</span></p>"#);
    assert!(doc.child(0).child(0).marks.is_empty());
}

#[test]
fn test_import_bare_text_and_whitespace() {
    let doc = parse_html("\n  hello\n  <b>world</b>\n<p>\n  next\n</p>\n");
    let texts: Vec<String> = doc.children.iter().map(|c| c.text_content()).collect();
    assert_eq!(texts, vec!["hello world", "next"]);
}

#[test]
fn test_import_empty_input() {
    let doc = parse_html("<!-- nothing -->");
    assert_eq!(doc, Node::empty_doc());
}

#[test]
fn test_import_image_inside_paragraph_splits_it() {
    let doc = parse_html(r#"<p>before<img src="a.png" width="40">after</p>"#);
    let kinds: Vec<&str> = doc.children.iter().map(|c| c.kind.name()).collect();
    assert_eq!(kinds, vec!["paragraph", "image", "paragraph"]);
    assert_eq!(
        doc.child(1).kind,
        NodeKind::Image {
            src: "a.png".to_string(),
            width: Some(40)
        }
    );
}

#[test]
fn test_import_repairs_ragged_table() {
    let doc = parse_html(
        "<table><tbody><tr><td>a</td><td>b</td><td>c</td></tr><tr><td>d</td></tr></tbody></table>",
    );
    let map = TableMap::build(doc.child(0)).unwrap();
    assert_eq!((map.width, map.height), (3, 2));
    assert_eq!(doc.child(0).child(1).child_count(), 3);
}

#[test]
fn test_import_clamps_spans() {
    let doc = parse_html(r#"<table><tr><td rowspan="5">a</td><td>b</td></tr></table>"#);
    let map = TableMap::build(doc.child(0)).unwrap();
    assert_eq!(map.height, 1);
    assert_eq!(map.cells[0].rowspan, 1);
}

#[test]
fn test_import_implied_list_items() {
    let doc = parse_html("<ul><li>one<li>two</ul>");
    let list = doc.child(0);
    assert_eq!(list.kind, NodeKind::BulletList);
    assert_eq!(list.child_count(), 2);
    assert_eq!(list.child(1).text_content(), "two");
}

#[test]
fn test_import_task_list_checkbox() {
    let doc = parse_html(
        r#"<ul data-type="taskList"><li data-type="taskItem"><label><input type="checkbox" checked></label><div><p>milk</p></div></li></ul>"#,
    );
    let item = doc.child(0).child(0);
    assert_eq!(item.kind, NodeKind::TaskItem { checked: true });
    assert_eq!(item.text_content(), "milk");
}

#[test]
fn test_import_skips_script_and_style() {
    let doc = parse_html("<style>p > a { color: red }</style><script>if (a<b) {}</script><p>ok</p>");
    assert_eq!(doc.child_count(), 1);
    assert_eq!(doc.child(0).text_content(), "ok");
}

#[test]
fn test_import_google_docs_wrapper() {
    let doc = parse_html(
        r#"<b style="font-weight:normal;" id="docs-internal"><p><span style="font-weight:700">Bold</span><span> plain</span></p></b>"#,
    );
    let paragraph = doc.child(0);
    assert!(paragraph.child(0).marks.has_type(MarkType::Bold));
    assert!(paragraph.child(1).marks.is_empty());
}

#[test]
fn test_text_to_doc() {
    let doc = text_to_doc("one\n\nthree");
    assert_eq!(doc.child_count(), 3);
    assert!(doc.child(1).is_empty_textblock());
}
