use nextnote_editor::{
    ClipboardData, Command, Document, EditSession, EditorConfig, EditorResult, HtmlOptions,
    PasteRequest,
};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// One editing session driven from the browser
#[wasm_bindgen]
pub struct NoteEditor {
    session: EditSession,
    pending_paste: Option<PasteRequest>,
}

impl NoteEditor {
    fn open(json: Option<&str>, config: Option<&str>) -> EditorResult<Self> {
        let document = match json {
            Some(json) => Document::from_json_str(json)?,
            None => Document::empty(),
        };
        let config = match config {
            Some(config) => serde_json::from_str(config)?,
            None => EditorConfig::default(),
        };
        Ok(Self {
            session: EditSession::new("browser", document, config),
            pending_paste: None,
        })
    }

    fn run(&mut self, command_json: &str) -> EditorResult<bool> {
        let command: Command = serde_json::from_str(command_json)?;
        self.session.execute(command)
    }

    fn paste_data(&mut self, data: ClipboardData) -> EditorResult<bool> {
        let request = self
            .pending_paste
            .take()
            .unwrap_or_else(|| self.session.begin_paste());
        self.session.complete_paste(request, data)
    }
}

#[wasm_bindgen]
impl NoteEditor {
    /// Open a persisted note, or an empty one when `json` is absent
    #[wasm_bindgen(constructor)]
    pub fn new(json: Option<String>, config: Option<String>) -> Result<NoteEditor, JsValue> {
        Self::open(json.as_deref(), config.as_deref()).map_err(to_js)
    }

    /// Run a command given as JSON, e.g. `{"command": "toggleMark", "mark": {"type": "bold"}}`.
    /// Resolves to whether the document changed.
    pub fn execute(&mut self, command_json: &str) -> Result<bool, JsValue> {
        self.run(command_json).map_err(to_js)
    }

    pub fn undo(&mut self) -> bool {
        self.session.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.session.redo()
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.session.can_undo()
    }

    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.session.can_redo()
    }

    #[wasm_bindgen(getter)]
    pub fn version(&self) -> f64 {
        self.session.version() as f64
    }

    #[wasm_bindgen(js_name = toJson)]
    pub fn to_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.document().to_json()).map_err(to_js)
    }

    #[wasm_bindgen(js_name = toHtml)]
    pub fn to_html(&self, pretty: bool) -> String {
        let options = if pretty {
            HtmlOptions::pretty()
        } else {
            HtmlOptions::default()
        };
        self.session.document().to_html(options)
    }

    #[wasm_bindgen(js_name = toText)]
    pub fn to_text(&self) -> String {
        self.session.document().text()
    }

    /// Current selection as `{"anchor": n, "head": n}`
    pub fn selection(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.document().selection()).map_err(to_js)
    }

    /// Clipboard payload `{"html", "text"}` for the selection, if any
    pub fn copy(&self) -> Result<Option<String>, JsValue> {
        let data = self.session.copy().map_err(to_js)?;
        data.map(|data| serde_json::to_string(&data).map_err(to_js))
            .transpose()
    }

    pub fn cut(&mut self) -> Result<Option<String>, JsValue> {
        let data = self.session.cut().map_err(to_js)?;
        data.map(|data| serde_json::to_string(&data).map_err(to_js))
            .transpose()
    }

    /// Call before reading the system clipboard; a later `paste` is dropped
    /// if the document changed in between
    #[wasm_bindgen(js_name = beginPaste)]
    pub fn begin_paste(&mut self) {
        self.pending_paste = Some(self.session.begin_paste());
    }

    pub fn paste(&mut self, html: Option<String>, text: Option<String>) -> Result<bool, JsValue> {
        self.paste_data(ClipboardData { html, text }).map_err(to_js)
    }
}
