use crate::codec::{self, ExportFormat};
use crate::model::{Document, LineAction, Mode};
use crate::persist::{BlobStore, Snapshot, STORAGE_KEY};

/// Platform-agnostic session state.
///
/// Owns the current document and display preferences, and writes a full
/// snapshot to its store after every change to either. Store failures are
/// logged and never reach the caller; the in-memory state stays usable.
pub struct Session<S: BlobStore> {
    document: Document,
    mode: Mode,
    dark_mode: bool,
    store: S,
}

impl<S: BlobStore> Session<S> {
    /// Fresh session with an empty document. Call [`Session::load`] to
    /// restore a previous one.
    pub fn new(store: S) -> Self {
        Self {
            document: Document::empty(),
            mode: Mode::default(),
            dark_mode: false,
            store,
        }
    }

    /// Fresh session, restored from the store if it holds a snapshot
    pub fn restore(store: S) -> Self {
        let mut session = Self::new(store);
        session.load();
        session
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // Import

    /// Replace the document with `input` split into lines
    pub fn import_text(&mut self, title: &str, input: &str) {
        self.replace_document(codec::text::parse(title, input));
    }

    /// Replace the document with the marked lines found in `input`
    pub fn import_html(&mut self, input: &str) {
        self.replace_document(codec::html::parse(input));
    }

    fn replace_document(&mut self, doc: Document) {
        log::info!("Loaded \"{}\" ({} lines, {} annotated)", doc.title, doc.len(), doc.annotation_count());
        self.document = doc;
        self.save();
    }

    // Annotation editing

    pub fn annotation(&self, index: usize) -> Option<&str> {
        self.document.annotation(index)
    }

    /// Set or (with blank text) clear the note on line `index`.
    ///
    /// Returns `false` and changes nothing when `index` is out of range.
    pub fn set_annotation(&mut self, index: usize, text: &str) -> bool {
        if !self.document.set_annotation(index, text) {
            log::debug!("Ignoring annotation for line {} (document has {} lines)", index, self.document.len());
            return false;
        }
        self.save();
        true
    }

    /// Resolve a user interaction with line `index` under the current mode
    pub fn activate_line(&self, index: usize) -> Option<LineAction<'_>> {
        self.document.line(index)?;
        let note = self.document.annotation(index);
        Some(match self.mode {
            Mode::Edit => LineAction::Edit { current: note },
            Mode::Reveal => LineAction::Reveal(note),
        })
    }

    // Preferences

    /// Flip between edit and reveal. Touches neither document nor store.
    pub fn toggle_mode(&mut self) -> Mode {
        self.mode = self.mode.toggled();
        self.mode
    }

    pub fn toggle_dark_mode(&mut self) -> bool {
        self.dark_mode = !self.dark_mode;
        self.save();
        self.dark_mode
    }

    // Export

    pub fn export(&self, format: ExportFormat) -> Option<String> {
        match format {
            ExportFormat::Html => codec::html::render(&self.document),
            ExportFormat::Text => codec::text::render(&self.document),
        }
    }

    pub fn export_html(&self) -> Option<String> {
        self.export(ExportFormat::Html)
    }

    pub fn export_text(&self) -> Option<String> {
        self.export(ExportFormat::Text)
    }

    /// Suggested file name for an export of the current document
    pub fn export_filename(&self, format: ExportFormat) -> String {
        codec::export_filename(&self.document.title, format)
    }

    // Persistence

    /// Write the full snapshot, overwriting any previous one
    pub fn save(&mut self) {
        let json = match Snapshot::capture(&self.document, self.dark_mode).to_json() {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Session not saved: {:#}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(STORAGE_KEY, &json) {
            log::warn!("Session not saved: {:#}", e);
        }
    }

    /// Replace in-memory state with the stored snapshot.
    ///
    /// Returns `false`, leaving state untouched, if there is no snapshot or
    /// it cannot be read.
    pub fn load(&mut self) -> bool {
        let json = match self.store.get(STORAGE_KEY) {
            Ok(Some(json)) => json,
            Ok(None) => return false,
            Err(e) => {
                log::warn!("Session not restored: {:#}", e);
                return false;
            }
        };

        match Snapshot::from_json(&json) {
            Ok(snapshot) => {
                self.dark_mode = snapshot.dark_mode;
                self.document = snapshot.into_document();
                log::info!("Restored session ({} lines)", self.document.len());
                true
            }
            Err(e) => {
                log::warn!("Session not restored: {:#}", e);
                false
            }
        }
    }

    /// Remove the stored snapshot. In-memory state is left alone.
    pub fn clear(&mut self) {
        if let Err(e) = self.store.remove(STORAGE_KEY) {
            log::warn!("Stored session not removed: {:#}", e);
        }
    }

    /// Drop the document, return to edit mode and purge the stored snapshot
    pub fn reset(&mut self) {
        self.document = Document::empty();
        self.mode = Mode::Edit;
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStore;
    use anyhow::{bail, Result};

    /// Store that rejects every operation
    struct BrokenStore;

    impl BlobStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            bail!("storage unavailable")
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            bail!("quota exceeded")
        }

        fn remove(&mut self, _key: &str) -> Result<()> {
            bail!("storage unavailable")
        }
    }

    fn stored(session: &Session<MemoryStore>) -> Option<Snapshot> {
        session
            .store()
            .get(STORAGE_KEY)
            .unwrap()
            .map(|json| Snapshot::from_json(&json).unwrap())
    }

    #[test]
    fn test_import_and_annotate() {
        let mut session = Session::new(MemoryStore::new());
        session.import_text("t", "a\n\nb");

        assert_eq!(session.document().lines(), &["a", "", "b"]);
        assert!(session.document().annotations().is_empty());

        assert!(session.set_annotation(1, "note"));
        assert_eq!(session.annotation(1), Some("note"));
        assert_eq!(session.export_text().as_deref(), Some("a\n /* note */\nb"));
    }

    #[test]
    fn test_every_edit_is_persisted() {
        let mut session = Session::new(MemoryStore::new());
        session.import_text("t", "x\ny");
        assert_eq!(stored(&session).unwrap().lines, vec!["x", "y"]);

        session.set_annotation(0, "first");
        assert_eq!(stored(&session).unwrap().annotations.get(&0).map(String::as_str), Some("first"));

        session.set_annotation(0, "   ");
        assert!(stored(&session).unwrap().annotations.is_empty());
    }

    #[test]
    fn test_out_of_range_edit_changes_nothing() {
        let mut session = Session::new(MemoryStore::new());
        session.import_text("t", "only");
        session.set_annotation(0, "kept");
        let before = session.store().get(STORAGE_KEY).unwrap();

        assert!(!session.set_annotation(1, "nope"));
        assert_eq!(session.document().annotations().len(), 1);
        assert_eq!(session.store().get(STORAGE_KEY).unwrap(), before);
    }

    #[test]
    fn test_save_and_restore() {
        let mut session = Session::new(MemoryStore::new());
        session.import_text("draft", "one\ntwo\nthree");
        session.set_annotation(2, "end");
        session.toggle_dark_mode();

        let restored = Session::restore(session.store().clone());
        assert_eq!(restored.document().lines(), session.document().lines());
        assert_eq!(restored.document().annotations(), session.document().annotations());
        assert_eq!(restored.document().id, session.document().id);
        assert_eq!(restored.document().title, "draft");
        assert!(restored.dark_mode());
    }

    #[test]
    fn test_load_without_snapshot() {
        let mut session = Session::new(MemoryStore::new());
        assert!(!session.load());
        assert!(session.document().is_empty());
    }

    #[test]
    fn test_load_malformed_snapshot() {
        let mut store = MemoryStore::new();
        store.set(STORAGE_KEY, "{ definitely not json").unwrap();

        let session = Session::restore(store);
        assert!(session.document().is_empty());
        assert!(!session.dark_mode());
    }

    #[test]
    fn test_broken_store_keeps_session_usable() {
        let mut session = Session::new(BrokenStore);
        assert!(!session.load());

        session.import_text("t", "a\nb");
        assert!(session.set_annotation(0, "still here"));
        assert!(session.toggle_dark_mode());
        session.clear();

        assert_eq!(session.annotation(0), Some("still here"));
        assert_eq!(session.export_text().as_deref(), Some("a /* still here */\nb"));
    }

    #[test]
    fn test_clear_keeps_memory_reset_drops_both() {
        let mut session = Session::new(MemoryStore::new());
        session.import_text("t", "a");

        session.clear();
        assert!(stored(&session).is_none());
        assert_eq!(session.document().len(), 1);

        session.save();
        session.toggle_mode();
        session.reset();
        assert!(stored(&session).is_none());
        assert!(session.document().is_empty());
        assert_eq!(session.mode(), Mode::Edit);
        assert_eq!(session.export_html(), None);
        assert_eq!(session.export_text(), None);
    }

    #[test]
    fn test_mode_toggle_and_line_actions() {
        let mut session = Session::new(MemoryStore::new());
        session.import_text("t", "a\nb");
        session.set_annotation(0, "note");
        let before = session.store().get(STORAGE_KEY).unwrap();

        assert_eq!(session.activate_line(0), Some(LineAction::Edit { current: Some("note") }));
        assert_eq!(session.activate_line(1), Some(LineAction::Edit { current: None }));

        assert_eq!(session.toggle_mode(), Mode::Reveal);
        assert_eq!(session.activate_line(0), Some(LineAction::Reveal(Some("note"))));
        assert_eq!(session.activate_line(1), Some(LineAction::Reveal(None)));
        assert_eq!(session.activate_line(2), None);

        assert_eq!(session.store().get(STORAGE_KEY).unwrap(), before);
    }

    #[test]
    fn test_html_import_replaces_document() {
        let mut session = Session::new(MemoryStore::new());
        session.import_text("t", "old\nlines\nhere");
        session.set_annotation(2, "stale");

        let html = r#"<div class="line" data-annotation="fresh">new</div>"#;
        session.import_html(html);

        assert_eq!(session.document().lines(), &["new"]);
        assert_eq!(session.annotation(0), Some("fresh"));
        assert_eq!(session.annotation(2), None);

        session.import_html("<p>no lines</p>");
        assert!(session.document().is_empty());
        assert!(session.document().annotations().is_empty());
    }

    #[test]
    fn test_html_export_round_trips_through_session() {
        let mut session = Session::new(MemoryStore::new());
        session.import_text("t", "  x < y\n\"quoted\"");
        session.set_annotation(1, "it's <fine> & \"safe\"");

        let html = session.export_html().unwrap();
        let mut other = Session::new(MemoryStore::new());
        other.import_html(&html);

        assert_eq!(other.document().lines(), session.document().lines());
        assert_eq!(other.document().annotations(), session.document().annotations());
    }
}
