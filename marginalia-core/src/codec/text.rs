//! Plain-text import and annotated-text export.
//!
//! Export appends `" /* note */"` to annotated lines. There is no
//! parser for that output: a marker added on export cannot be told apart from
//! source text that already ended in the same pattern, so the path is lossy.

use crate::model::Document;

/// Split `input` on line feeds into a fresh, unannotated document.
///
/// Segments are kept verbatim, including any trailing `'\r'`. Empty input
/// gives a document with no lines.
pub fn parse(title: &str, input: &str) -> Document {
    let lines = if input.is_empty() {
        Vec::new()
    } else {
        input.split('\n').map(String::from).collect()
    };
    Document::new(title.to_string(), lines)
}

/// Render each line, followed by its note in a comment marker when it has one.
///
/// Returns `None` when there is nothing to export.
pub fn render(doc: &Document) -> Option<String> {
    if doc.is_empty() {
        return None;
    }

    let out: Vec<String> = doc
        .lines()
        .iter()
        .enumerate()
        .map(|(i, line)| match doc.annotation(i) {
            Some(note) => format!("{} /* {} */", line, note),
            None => line.clone(),
        })
        .collect();

    Some(out.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_blank_lines() {
        let doc = parse("t", "a\n\nb");
        assert_eq!(doc.lines(), &["a", "", "b"]);
        assert!(doc.annotations().is_empty());
    }

    #[test]
    fn test_parse_is_verbatim() {
        let doc = parse("t", "  indented\r\n\ttab\n");
        assert_eq!(doc.lines(), &["  indented\r", "\ttab", ""]);
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse("t", "").is_empty());
    }

    #[test]
    fn test_render_appends_markers() {
        let mut doc = parse("t", "a\n\nb");
        doc.set_annotation(1, "note");

        assert_eq!(render(&doc).as_deref(), Some("a\n /* note */\nb"));
    }

    #[test]
    fn test_render_does_not_escape_notes() {
        let mut doc = parse("t", "x = 1;");
        doc.set_annotation(0, "see */ <b>here</b>");

        assert_eq!(render(&doc).as_deref(), Some("x = 1; /* see */ <b>here</b> */"));
    }

    #[test]
    fn test_render_empty_document() {
        assert_eq!(render(&Document::empty()), None);
    }
}
