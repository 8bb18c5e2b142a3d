//! Export/import round trips

use nextnote_html::{compile_to_html, parse_html, HtmlOptions};
use nextnote_model::{empty_table, Mark, Node, NodeKind, TextAlign};

fn sample_note() -> Node {
    let mut heading = Node::heading(3, vec![Node::plain_text("Plan")]);
    heading.kind.set_align(TextAlign::Right);

    let mut table = empty_table(2, 3, true);
    if let Some(cell) = table.node_at_mut(1) {
        cell.children = vec![std::sync::Arc::new(Node::paragraph_text("when"))];
    }

    Node::doc(vec![
        heading,
        Node::paragraph(vec![
            Node::plain_text("Meet "),
            Node::marked_text("Ana", [Mark::Bold, Mark::Underline]),
            Node::plain_text(" at "),
            Node::marked_text(
                "the café",
                [
                    Mark::Link {
                        href: "https://maps.example.com/?q=caf%C3%A9&z=3".to_string(),
                    },
                    Mark::TextColor {
                        color: "#336699".to_string(),
                    },
                ],
            ),
            Node::marked_text("2", [Mark::Superscript]),
        ]),
        Node::task_list(vec![
            Node::task_item(false, vec![Node::paragraph_text("book table")]),
            Node::task_item(true, vec![Node::paragraph_text("invite <everyone>")]),
        ]),
        Node::new(
            NodeKind::OrderedList { start: 2 },
            vec![Node::list_item(vec![
                Node::paragraph_text("outer"),
                Node::bullet_list(vec![Node::list_item(vec![Node::paragraph_text("inner")])]),
            ])],
        ),
        table,
        Node::image("https://img.example.com/map.png", Some(480)),
        Node::horizontal_rule(),
        Node::paragraph(vec![]),
    ])
}

#[test]
fn test_own_export_imports_losslessly() {
    let doc = sample_note();
    doc.check().unwrap();

    let html = compile_to_html(&doc, HtmlOptions::default());
    let imported = parse_html(&html);
    assert_eq!(imported, doc);
}

#[test]
fn test_pretty_export_imports_losslessly() {
    let doc = sample_note();
    let html = compile_to_html(&doc, HtmlOptions::pretty());
    assert_eq!(parse_html(&html), doc);
}

#[test]
fn test_import_is_stable_after_first_normalization() {
    let messy = r#"
        <html><head><title>x</title></head><body>
        <div><h5>Deep   heading</h5>loose <em>text</em><br>more</div>
        <ul><li></li><li><p>a</p><ol><li>b</li></ol></li></ul>
        <table><tr><td colspan="3">wide</td></tr><tr><th>h</th></tr></table>
        <p style="text-align: justify; margin: 4px">end &amp; done&nbsp;</p>
        <blockquote>quoted</blockquote><marquee>unknown</marquee>
        </body></html>
    "#;

    let first = parse_html(messy);
    first.check().unwrap();
    let once = compile_to_html(&first, HtmlOptions::default());
    let second = parse_html(&once);
    let twice = compile_to_html(&second, HtmlOptions::default());

    assert_eq!(second.text_content(), first.text_content());
    assert_eq!(once, twice);
}
