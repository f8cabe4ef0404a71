//! Marginalia Web - WebAssembly bindings for the line annotator
//!
//! Exposes a [`MarginaliaSession`] class to JavaScript. The page owns all
//! rendering and event wiring and calls into the session for every import,
//! edit, export and preference change. State is kept in `localStorage`.

use js_sys::{Array, Object, Reflect};
use wasm_bindgen::prelude::*;

use marginalia_core::{BlobStore, ExportFormat, LineAction, MemoryStore, Mode, Session};

pub mod io;

use io::LocalStorage;

/// Initialize logging for the WASM module
#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();

    console_log::init_with_level(log::Level::Info)
        .map_err(|e| JsValue::from_str(&format!("Failed to initialize logger: {}", e)))?;

    log::info!("Marginalia WASM initialized");
    Ok(())
}

fn parse_format(format: &str) -> Result<ExportFormat, JsValue> {
    match format {
        "html" => Ok(ExportFormat::Html),
        "text" | "txt" => Ok(ExportFormat::Text),
        other => Err(JsValue::from_str(&format!("Unknown export format: {}", other))),
    }
}

/// Annotation session bound to browser storage
#[wasm_bindgen]
pub struct MarginaliaSession {
    inner: Session<Box<dyn BlobStore>>,
}

#[wasm_bindgen]
impl MarginaliaSession {
    /// Open a session, restoring the previous one from `localStorage`.
    ///
    /// Falls back to an in-memory store when storage is unavailable (private
    /// browsing, sandboxed iframes).
    #[wasm_bindgen(constructor)]
    pub fn new() -> MarginaliaSession {
        let store: Box<dyn BlobStore> = match LocalStorage::open() {
            Ok(storage) => Box::new(storage),
            Err(e) => {
                log::warn!("{:#}; changes will not persist", e);
                Box::new(MemoryStore::new())
            }
        };

        Self {
            inner: Session::restore(store),
        }
    }

    #[wasm_bindgen(js_name = importText)]
    pub fn import_text(&mut self, title: &str, text: &str) {
        self.inner.import_text(title, text);
    }

    #[wasm_bindgen(js_name = importHtml)]
    pub fn import_html(&mut self, html: &str) {
        self.inner.import_html(html);
    }

    #[wasm_bindgen(js_name = setAnnotation)]
    pub fn set_annotation(&mut self, index: usize, text: &str) -> bool {
        self.inner.set_annotation(index, text)
    }

    pub fn annotation(&self, index: usize) -> Option<String> {
        self.inner.annotation(index).map(String::from)
    }

    /// `{ action: "edit" | "reveal", note: string | null }`, or `undefined`
    /// when `index` is not a line
    #[wasm_bindgen(js_name = activateLine)]
    pub fn activate_line(&self, index: usize) -> Result<JsValue, JsValue> {
        let (action, note) = match self.inner.activate_line(index) {
            Some(LineAction::Edit { current }) => ("edit", current),
            Some(LineAction::Reveal(note)) => ("reveal", note),
            None => return Ok(JsValue::UNDEFINED),
        };

        let obj = Object::new();
        Reflect::set(&obj, &"action".into(), &action.into())?;
        let note = note.map(JsValue::from_str).unwrap_or(JsValue::NULL);
        Reflect::set(&obj, &"note".into(), &note)?;
        Ok(obj.into())
    }

    /// Flip edit/reveal; returns the new mode name
    #[wasm_bindgen(js_name = toggleMode)]
    pub fn toggle_mode(&mut self) -> String {
        self.inner.toggle_mode().as_str().to_string()
    }

    #[wasm_bindgen(js_name = isRevealMode)]
    pub fn is_reveal_mode(&self) -> bool {
        self.inner.mode() == Mode::Reveal
    }

    #[wasm_bindgen(js_name = toggleDarkMode)]
    pub fn toggle_dark_mode(&mut self) -> bool {
        self.inner.toggle_dark_mode()
    }

    #[wasm_bindgen(js_name = isDarkMode)]
    pub fn is_dark_mode(&self) -> bool {
        self.inner.dark_mode()
    }

    #[wasm_bindgen(js_name = exportHtml)]
    pub fn export_html(&self) -> Option<String> {
        self.inner.export_html()
    }

    #[wasm_bindgen(js_name = exportText)]
    pub fn export_text(&self) -> Option<String> {
        self.inner.export_text()
    }

    /// Suggested download name for `"html"` or `"text"` exports
    #[wasm_bindgen(js_name = exportFilename)]
    pub fn export_filename(&self, format: &str) -> Result<String, JsValue> {
        Ok(self.inner.export_filename(parse_format(format)?))
    }

    /// MIME type to label a download of `"html"` or `"text"` exports with
    #[wasm_bindgen(js_name = exportMimeType)]
    pub fn export_mime_type(&self, format: &str) -> Result<String, JsValue> {
        Ok(parse_format(format)?.mime_type().to_string())
    }

    pub fn title(&self) -> String {
        self.inner.document().title.clone()
    }

    pub fn lines(&self) -> Array {
        self.inner
            .document()
            .lines()
            .iter()
            .map(|line| JsValue::from_str(line))
            .collect()
    }

    #[wasm_bindgen(js_name = lineCount)]
    pub fn line_count(&self) -> usize {
        self.inner.document().len()
    }

    #[wasm_bindgen(js_name = annotationCount)]
    pub fn annotation_count(&self) -> usize {
        self.inner.document().annotation_count()
    }

    /// Drop the document and the stored session
    pub fn reset(&mut self) {
        self.inner.reset();
    }
}

impl Default for MarginaliaSession {
    fn default() -> Self {
        Self::new()
    }
}
