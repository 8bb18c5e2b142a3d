//! Integration tests for editor crate

use nextnote_editor::{
    ClipboardData, Command, Document, EditSession, EditorConfig, EditorError, FileStore, Mark,
    MemoryStore, Node, NodeKind, NoteStore, Selection, SessionEvent,
};
use nextnote_model::{to_json_string, TableMap};
use std::sync::Arc;

fn session_with(blocks: Vec<Node>) -> EditSession {
    let doc = Document::new(Node::doc(blocks)).unwrap();
    EditSession::new("test", doc, EditorConfig::default())
}

fn select(session: &mut EditSession, anchor: usize, head: usize) {
    session.execute(Command::CollapseTo { pos: anchor }).unwrap();
    session.execute(Command::ExtendTo { pos: head }).unwrap();
}

fn table_of(session: &EditSession) -> &Node {
    session
        .document()
        .root()
        .children
        .iter()
        .find(|block| block.kind == NodeKind::Table)
        .expect("document has a table")
}

#[test]
fn test_insert_table_with_header_row() {
    let mut session = EditSession::new("t", Document::empty(), EditorConfig::default());
    session
        .execute(Command::InsertTable {
            rows: 3,
            cols: 3,
            with_header_row: true,
        })
        .unwrap();

    let table = table_of(&session);
    assert_eq!(table.child_count(), 3);
    for (r, row) in table.children.iter().enumerate() {
        assert_eq!(row.child_count(), 3);
        for cell in &row.children {
            let header = matches!(cell.kind, NodeKind::TableHeaderCell(_));
            assert_eq!(header, r == 0, "row {r}");
        }
    }
}

#[test]
fn test_bold_hello() {
    let mut session = session_with(vec![Node::paragraph_text("say hello world")]);
    // "say " is 4 chars after the paragraph opens at 0
    select(&mut session, 5, 10);
    assert_eq!(session.document().selected_text(), "hello");
    session.execute(Command::toggle_bold()).unwrap();

    let paragraph = session.document().root().child(0);
    let texts: Vec<(&str, bool)> = paragraph
        .children
        .iter()
        .map(|t| (t.text_value().unwrap(), t.marks.contains(&Mark::Bold)))
        .collect();
    assert_eq!(
        texts,
        vec![("say ", false), ("hello", true), (" world", false)]
    );
}

#[test]
fn test_lift_outside_list_leaves_document_unchanged() {
    let mut session = session_with(vec![Node::paragraph_text("plain")]);
    let before = to_json_string(session.document().root());

    let err = session.execute(Command::LiftListItem).unwrap_err();
    assert!(matches!(err, EditorError::CommandRejected { .. }));
    assert_eq!(to_json_string(session.document().root()), before);
    assert_eq!(session.version(), 0);
}

#[test]
fn test_undo_redo_restores_every_state() {
    let mut session = EditSession::new("t", Document::empty(), EditorConfig::default());
    let script = vec![
        Command::InsertText {
            text: "first".to_string(),
        },
        Command::SplitBlock,
        Command::InsertText {
            text: "second".to_string(),
        },
        Command::SelectAll,
        Command::toggle_bold(),
        Command::ToggleBulletList,
        Command::CollapseTo { pos: 3 },
        Command::InsertText {
            text: "!".to_string(),
        },
    ];

    let mut states = vec![session.document().clone()];
    for command in script {
        let committed = session.execute(command).unwrap();
        let current = session.document().clone();
        if committed {
            states.push(current);
        } else if let Some(last) = states.last_mut() {
            *last = current;
        }
    }
    assert_eq!(session.history().undo_levels(), states.len() - 1);

    for expected in states.iter().rev().skip(1) {
        assert!(session.undo());
        assert_eq!(session.document(), expected);
    }
    assert!(!session.undo());

    for expected in states.iter().skip(1) {
        assert!(session.redo());
        assert_eq!(session.document(), expected);
    }
    assert!(!session.redo());
}

#[test]
fn test_table_stays_rectangular() {
    let mut session = EditSession::new("t", Document::empty(), EditorConfig::default());
    session
        .execute(Command::InsertTable {
            rows: 2,
            cols: 2,
            with_header_row: false,
        })
        .unwrap();

    // cell (0,0) through cell (1,1)
    select(&mut session, 4, 18);
    session.execute(Command::MergeCells).unwrap();
    TableMap::build(table_of(&session)).unwrap();

    let script = [
        Command::AddRowAfter,
        Command::AddColumnBefore,
        Command::AddColumnAfter,
        Command::SplitCell,
        Command::AddRowBefore,
        Command::DeleteColumn,
        Command::ToggleHeaderColumn,
        Command::DeleteRow,
        Command::AddColumnAfter,
    ];
    for command in script {
        let name = command.name();
        // refusals are fine; any tree that lands must be rectangular
        let _ = session.execute(command);
        let table = table_of(&session);
        let map = TableMap::build(table).unwrap_or_else(|err| panic!("after {name}: {err}"));
        assert_eq!(map.height, table.child_count());
        assert!(map.width > 0);
    }
}

#[test]
fn test_copy_then_paste_into_other_session() {
    let mut source = session_with(vec![
        Node::paragraph_text("hello world"),
        Node::paragraph_text("second"),
    ]);
    select(&mut source, 1, 6);
    let data = source.copy().unwrap().unwrap();
    assert_eq!(data.text.as_deref(), Some("hello"));
    assert!(data.html.as_deref().unwrap().contains("hello"));

    let mut target = EditSession::new("target", Document::empty(), EditorConfig::default());
    let request = target.begin_paste();
    assert!(target.complete_paste(request, data).unwrap());
    assert_eq!(target.document().text(), "hello");
    assert_eq!(target.document().selection(), Selection::cursor(6));
    assert_eq!(target.history().undo_description(), Some("paste"));
}

#[test]
fn test_stale_paste_is_dropped() {
    let mut session = EditSession::new("t", Document::empty(), EditorConfig::default());
    let request = session.begin_paste();
    session
        .execute(Command::InsertText {
            text: "typed".to_string(),
        })
        .unwrap();

    let pasted = session
        .complete_paste(request, ClipboardData::text("late"))
        .unwrap();
    assert!(!pasted);
    assert_eq!(session.document().text(), "typed");
}

#[test]
fn test_paste_plain_text_lines() {
    let mut session = EditSession::new("t", Document::empty(), EditorConfig::default());
    let request = session.begin_paste();
    assert!(session
        .complete_paste(request, ClipboardData::text("one\ntwo"))
        .unwrap());
    assert_eq!(session.document().text(), "one\ntwo");
    assert_eq!(session.document().root().child_count(), 2);
}

#[test]
fn test_cut_removes_selection() {
    let mut session = session_with(vec![Node::paragraph_text("hello world")]);
    select(&mut session, 1, 7);
    let data = session.cut().unwrap().unwrap();
    assert_eq!(data.text.as_deref(), Some("hello "));
    assert_eq!(session.document().text(), "world");
    assert!(session.can_undo());
}

#[test]
fn test_events_follow_commands() {
    let mut session = EditSession::new("t", Document::empty(), EditorConfig::default());
    let mut events = session.subscribe();

    session
        .execute(Command::InsertText {
            text: "a".to_string(),
        })
        .unwrap();
    session.execute(Command::Undo).unwrap();

    let mut versions = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::DocumentChanged { version, .. } = event {
            versions.push(version);
        }
    }
    assert_eq!(versions, vec![1, 2]);
}

#[tokio::test]
async fn test_save_and_open_memory_store() {
    let store = Arc::new(MemoryStore::new());
    let mut session = EditSession::new("note-1", Document::empty(), EditorConfig::default());
    let mut events = session.subscribe();
    session
        .execute(Command::InsertText {
            text: "kept".to_string(),
        })
        .unwrap();

    session.save(store.clone(), "note-1").await.unwrap();

    let mut saved = None;
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::Saved { note_id, version } = event {
            saved = Some((note_id, version));
        }
    }
    assert_eq!(saved, Some(("note-1".to_string(), 1)));

    let reopened = EditSession::open(store.as_ref(), "note-1", EditorConfig::default())
        .await
        .unwrap();
    assert_eq!(reopened.document().root(), session.document().root());
    assert_eq!(reopened.version(), 0);
}

#[tokio::test]
async fn test_open_missing_note() {
    let store = MemoryStore::new();
    let result = EditSession::open(&store, "absent", EditorConfig::default()).await;
    assert!(matches!(result, Err(EditorError::NotFound(_))));
}

#[tokio::test]
async fn test_file_store_round_trip() {
    let dir = std::env::temp_dir().join(format!("nextnote-store-{}", std::process::id()));
    let store = FileStore::new(&dir);

    let doc = Document::from_html("<h1>Title</h1><ul><li><p>item</p></li></ul>");
    store.save_note("plan", doc.to_json()).await.unwrap();
    assert!(dir.join("plan.json").exists());

    let loaded = store.load_note("plan").await.unwrap();
    assert_eq!(loaded, doc.to_json());
    assert!(matches!(
        store.load_note("other").await,
        Err(EditorError::NotFound(_))
    ));

    std::fs::remove_dir_all(&dir).unwrap();
}
