//! # Edit Session Management
//!
//! An EditSession is one open note: the current document, its history and a
//! stream of events for whoever renders it.
//!
//! Commands run one at a time. A command that fails leaves the document as
//! it was; the error is returned and also announced as a
//! [`SessionEvent::Notice`].

use crate::clipboard::{ClipboardData, PasteRequest};
use crate::commands::insert_fragment;
use crate::store::NoteStore;
use crate::{Command, Document, EditorConfig, EditorError, EditorResult, Selection, UndoStack};
use nextnote_html::{compile_to_html, parse_html, text_to_doc, HtmlOptions};
use nextnote_model::MarkSet;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

/// Something observers of a session may want to redraw or report
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The tree changed (command, undo, redo or paste)
    DocumentChanged { version: u64, document: Document },

    /// Sent after every successful command, with the marks typing would use
    SelectionChanged {
        selection: Selection,
        active_marks: MarkSet,
    },

    Saved { note_id: String, version: u64 },

    SaveFailed { note_id: String, reason: String },

    /// A command was refused; nothing changed
    Notice { message: String },
}

/// Single open note
pub struct EditSession {
    /// Session identifier, the note id when opened from a store
    pub id: String,

    /// Current document
    document: Document,

    history: UndoStack,

    config: EditorConfig,

    /// Bumped on every tree change
    version: u64,

    events: broadcast::Sender<SessionEvent>,
}

impl EditSession {
    pub fn new(id: impl Into<String>, document: Document, config: EditorConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            id: id.into(),
            document,
            history: UndoStack::with_max_levels(config.history_depth),
            config,
            version: 0,
            events,
        }
    }

    /// Load a note and start a session on it
    pub async fn open(store: &dyn NoteStore, id: &str, config: EditorConfig) -> EditorResult<Self> {
        let persisted = store.load_note(id).await?;
        let document = Document::from_json(&persisted)?;
        info!(note = id, size = document.size(), "opened note");
        Ok(Self::new(id, document, config))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Apply a command; returns whether the tree changed
    #[instrument(skip(self, command), fields(session = %self.id, command = command.name()))]
    pub fn execute(&mut self, command: Command) -> EditorResult<bool> {
        match command {
            Command::Undo => return Ok(self.undo()),
            Command::Redo => return Ok(self.redo()),
            _ => {}
        }

        let applied = match command.apply(&self.document) {
            Ok(applied) => applied,
            Err(err) => {
                if err.is_recoverable() {
                    debug!(%err, "command refused");
                } else {
                    // caller out of sync with the document
                    warn!(%err, "command failed");
                }
                self.emit(SessionEvent::Notice {
                    message: err.to_string(),
                });
                return Err(err);
            }
        };

        let committing = applied.committing;
        let previous = std::mem::replace(&mut self.document, applied.doc);
        if committing {
            self.history.record(&previous, Some(command.name()));
            self.changed();
        }
        // also covers pending marks changing under a collapsed cursor
        self.selection_changed();
        Ok(committing)
    }

    /// Run a list of commands, stopping at the first failure
    pub fn execute_all(&mut self, commands: impl IntoIterator<Item = Command>) -> EditorResult<usize> {
        let mut committed = 0;
        for command in commands {
            if self.execute(command)? {
                committed += 1;
            }
        }
        Ok(committed)
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.document) {
            Some(entry) => {
                debug!(description = ?entry.description, "undo");
                self.document = entry.into_document();
                self.changed();
                self.selection_changed();
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(&self.document) {
            Some(entry) => {
                debug!(description = ?entry.description, "redo");
                self.document = entry.into_document();
                self.changed();
                self.selection_changed();
                true
            }
            None => false,
        }
    }

    /// Clipboard values for the current selection; `None` when collapsed
    pub fn copy(&self) -> EditorResult<Option<ClipboardData>> {
        let selection = self.document.selection();
        if selection.is_collapsed() {
            return Ok(None);
        }
        let root = self.document.root();
        let slice = root.slice_between(selection.from(), selection.to())?;
        Ok(Some(ClipboardData {
            html: Some(compile_to_html(&slice, HtmlOptions::default())),
            text: Some(root.text_between(selection.from(), selection.to(), "\n")),
        }))
    }

    /// Copy, then delete the selection
    pub fn cut(&mut self) -> EditorResult<Option<ClipboardData>> {
        let Some(data) = self.copy()? else {
            return Ok(None);
        };
        self.execute(Command::DeleteSelection)?;
        Ok(Some(data))
    }

    /// Mark the start of a paste; the clipboard may be read asynchronously
    pub fn begin_paste(&self) -> PasteRequest {
        PasteRequest {
            selection: self.document.selection(),
            version: self.version,
        }
    }

    /// Insert resolved clipboard data. Returns `false` without touching the
    /// document when the request is stale or there is nothing to paste.
    #[instrument(skip_all, fields(session = %self.id, version = request.version))]
    pub fn complete_paste(&mut self, request: PasteRequest, data: ClipboardData) -> EditorResult<bool> {
        if request.version != self.version || request.selection != self.document.selection() {
            info!(current = self.version, "dropping stale paste");
            return Ok(false);
        }

        let fragment = match (&data.html, &data.text) {
            (Some(html), _) if !html.trim().is_empty() => {
                self.check_paste_size(html.len())?;
                parse_html(html)
            }
            (_, Some(text)) if !text.is_empty() => {
                self.check_paste_size(text.len())?;
                text_to_doc(text)
            }
            _ => return Ok(false),
        };

        let applied = match insert_fragment(&self.document, &fragment) {
            Ok(applied) => applied,
            Err(err) => {
                self.emit(SessionEvent::Notice {
                    message: err.to_string(),
                });
                return Err(err);
            }
        };
        if !applied.committing {
            return Ok(false);
        }

        let previous = std::mem::replace(&mut self.document, applied.doc);
        self.history.record(&previous, Some("paste"));
        self.changed();
        self.selection_changed();
        Ok(true)
    }

    /// Write the current document in the background; the outcome arrives as
    /// [`SessionEvent::Saved`] or [`SessionEvent::SaveFailed`]
    #[cfg(feature = "store")]
    pub fn save(
        &self,
        store: std::sync::Arc<dyn NoteStore>,
        note_id: impl Into<String>,
    ) -> tokio::task::JoinHandle<()> {
        let note_id = note_id.into();
        let snapshot = self.document.to_json();
        let version = self.version;
        let events = self.events.clone();

        tokio::spawn(async move {
            let event = match store.save_note(&note_id, snapshot).await {
                Ok(()) => {
                    info!(note = %note_id, version, "saved note");
                    SessionEvent::Saved { note_id, version }
                }
                Err(err) => {
                    warn!(note = %note_id, %err, "save failed");
                    SessionEvent::SaveFailed {
                        note_id,
                        reason: err.to_string(),
                    }
                }
            };
            let _ = events.send(event);
        })
    }

    fn check_paste_size(&self, len: usize) -> EditorResult<()> {
        if len > self.config.max_paste_bytes {
            return Err(EditorError::invalid(
                "clipboard",
                format!(
                    "{len} bytes exceeds the paste limit of {}",
                    self.config.max_paste_bytes
                ),
            ));
        }
        Ok(())
    }

    fn changed(&mut self) {
        self.version += 1;
        self.emit(SessionEvent::DocumentChanged {
            version: self.version,
            document: self.document.clone(),
        });
    }

    fn selection_changed(&self) {
        self.emit(SessionEvent::SelectionChanged {
            selection: self.document.selection(),
            active_marks: self.document.active_marks(),
        });
    }

    fn emit(&self, event: SessionEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}
