use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Title used when the source carries none
pub const DEFAULT_TITLE: &str = "Untitled";

/// A document split into lines, with at most one note per line
#[derive(Debug, Clone)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    lines: Vec<String>,
    annotations: BTreeMap<usize, String>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(title: String, lines: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            lines,
            annotations: BTreeMap::new(),
            updated_at: Utc::now(),
        }
    }

    /// A document with no lines
    pub fn empty() -> Self {
        Self::new(DEFAULT_TITLE.to_string(), Vec::new())
    }

    /// Build a document from already-split lines and notes.
    ///
    /// Notes that point past the last line or are blank are dropped, so the
    /// result always upholds the line/annotation invariant.
    pub fn from_parts(
        title: String,
        lines: Vec<String>,
        annotations: impl IntoIterator<Item = (usize, String)>,
    ) -> Self {
        let mut doc = Self::new(title, lines);
        for (index, text) in annotations {
            if index >= doc.len() {
                log::warn!("Dropping annotation for line {}: document has {} lines", index, doc.len());
                continue;
            }
            if text.trim().is_empty() {
                log::warn!("Dropping annotation for line {}: note is blank", index);
                continue;
            }
            doc.set_annotation(index, &text);
        }
        doc
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn annotations(&self) -> &BTreeMap<usize, String> {
        &self.annotations
    }

    pub fn annotation(&self, index: usize) -> Option<&str> {
        self.annotations.get(&index).map(|s| s.as_str())
    }

    pub fn annotation_count(&self) -> usize {
        self.annotations.len()
    }

    /// Attach `text` to line `index`, or remove the note when `text` is blank.
    ///
    /// Returns `false` without touching anything if `index` is out of range.
    pub fn set_annotation(&mut self, index: usize, text: &str) -> bool {
        if index >= self.lines.len() {
            return false;
        }

        let text = text.trim();
        if text.is_empty() {
            self.annotations.remove(&index);
        } else {
            self.annotations.insert(index, text.to_string());
        }
        self.updated_at = Utc::now();
        true
    }

    /// Lines that carry a note, as (index, line, note), in line order
    pub fn annotated_lines(&self) -> impl Iterator<Item = (usize, &str, &str)> + '_ {
        self.annotations
            .iter()
            .filter_map(|(&i, note)| self.line(i).map(|line| (i, line, note.as_str())))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::new(
            "Sample".to_string(),
            vec!["a".to_string(), String::new(), "b".to_string()],
        )
    }

    #[test]
    fn test_set_and_get_annotation() {
        let mut doc = sample();

        assert!(doc.set_annotation(1, "  note  "));
        assert_eq!(doc.annotation(1), Some("note"));
        assert_eq!(doc.annotation(0), None);
        assert_eq!(doc.annotation_count(), 1);
    }

    #[test]
    fn test_blank_text_removes_annotation() {
        let mut doc = sample();
        doc.set_annotation(2, "note");

        assert!(doc.set_annotation(2, "  \t "));
        assert_eq!(doc.annotation(2), None);
        assert!(doc.annotations().is_empty());
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let mut doc = sample();
        doc.set_annotation(0, "keep");
        let before = doc.updated_at;

        assert!(!doc.set_annotation(3, "nope"));
        assert!(!doc.set_annotation(usize::MAX, ""));
        assert_eq!(doc.annotations().len(), 1);
        assert_eq!(doc.annotation(0), Some("keep"));
        assert_eq!(doc.updated_at, before);
    }

    #[test]
    fn test_from_parts_drops_invalid_entries() {
        let doc = Document::from_parts(
            "T".to_string(),
            vec!["x".to_string(), "y".to_string()],
            vec![
                (0, "first".to_string()),
                (1, "   ".to_string()),
                (5, "stale".to_string()),
            ],
        );

        assert_eq!(doc.annotations().len(), 1);
        assert_eq!(doc.annotation(0), Some("first"));
    }

    #[test]
    fn test_annotated_lines_in_order() {
        let mut doc = sample();
        doc.set_annotation(2, "last");
        doc.set_annotation(0, "first");

        let found: Vec<_> = doc.annotated_lines().collect();
        assert_eq!(found, vec![(0, "a", "first"), (2, "b", "last")]);
    }
}
