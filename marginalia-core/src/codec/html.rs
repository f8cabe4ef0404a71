//! Self-contained annotated HTML, both directions.
//!
//! Every document line becomes an element with the class token `line`. An
//! annotated line also gets the class `annotated` and carries its note in
//! `data-annotation`. Import selects those elements positionally, so
//! `parse(&render(doc)?)` gives back the same lines and notes.

use std::borrow::Cow;

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use uuid::Uuid;

use crate::model::{Document, DEFAULT_TITLE};

/// Class token that marks an element as one text line
pub const LINE_CLASS: &str = "line";
/// Extra class token on lines that carry a note
pub const ANNOTATED_CLASS: &str = "annotated";
/// Attribute holding the note
pub const ANNOTATION_ATTR: &str = "data-annotation";
/// `<meta name=...>` that carries the document id
pub const ID_META: &str = "marginalia-id";

const STYLE: &str = r#"body { font-family: ui-monospace, SFMono-Regular, Menlo, monospace; margin: 2rem; background: #1e1e2e; color: #cdd6f4; }
.document { white-space: pre-wrap; line-height: 1.5; }
.line { min-height: 1.5em; padding: 0 0.25rem; }
.line.annotated { background: rgba(249, 226, 175, 0.15); border-left: 3px solid #f9e2af; cursor: help; position: relative; }
.line.annotated:hover::after { content: attr(data-annotation); position: absolute; left: 2rem; top: 100%; z-index: 1; max-width: 40rem; padding: 0.5rem 0.75rem; background: #313244; color: #cdd6f4; border-radius: 4px; white-space: pre-wrap; }"#;

const VOID_ELEMENTS: &[&[u8]] = &[
    b"area", b"base", b"br", b"col", b"embed", b"hr", b"img", b"input", b"link", b"meta",
    b"param", b"source", b"track", b"wbr",
];

/// Escape text that sits between tags.
pub fn escape_text(s: &str) -> String {
    partial_escape(s).into_owned()
}

/// Escape text for a double-quoted attribute value.
///
/// Quotes are escaped as well, and tab/newline/carriage-return become
/// character references so parsers cannot normalize them away.
pub fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render `doc` as a complete HTML page. Returns `None` for an empty document.
pub fn render(doc: &Document) -> Option<String> {
    if doc.is_empty() {
        return None;
    }

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n");
    html.push_str("<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\" />\n");
    html.push_str(&format!(
        "<meta name=\"{}\" content=\"{}\" />\n",
        ID_META, doc.id
    ));
    html.push_str(&format!("<title>{}</title>\n", escape_text(&doc.title)));
    html.push_str(&format!("<style>\n{}\n</style>\n", STYLE));
    html.push_str("</head>\n<body>\n<div class=\"document\">\n");

    for (i, line) in doc.lines().iter().enumerate() {
        match doc.annotation(i) {
            Some(note) => {
                let note = escape_attr(note);
                html.push_str(&format!(
                    "<div class=\"{} {}\" data-line=\"{}\" {}=\"{}\" title=\"{}\">{}</div>\n",
                    LINE_CLASS,
                    ANNOTATED_CLASS,
                    i,
                    ANNOTATION_ATTR,
                    note,
                    note,
                    escape_text(line)
                ));
            }
            None => {
                html.push_str(&format!(
                    "<div class=\"{}\" data-line=\"{}\">{}</div>\n",
                    LINE_CLASS,
                    i,
                    escape_text(line)
                ));
            }
        }
    }

    html.push_str("</div>\n</body>\n</html>\n");
    Some(html)
}

/// Read every element marked as a line, in document order.
///
/// Never fails: malformed markup stops the scan and keeps what was found so
/// far, and input without marked elements gives an empty document.
pub fn parse(input: &str) -> Document {
    let mut reader = Reader::from_str(input);
    reader.check_end_names(false);

    let mut lines: Vec<String> = Vec::new();
    let mut annotations: Vec<(usize, String)> = Vec::new();
    // Open non-void elements, with the line slot each one started (if any)
    let mut stack: Vec<(Vec<u8>, Option<usize>)> = Vec::new();

    let mut title = String::new();
    let mut id: Option<Uuid> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let slot = open_line(&e, &mut lines, &mut annotations);
                let name = e.local_name().as_ref().to_ascii_lowercase();
                if is_void(&name) {
                    read_id_meta(&e, &mut id);
                    continue;
                }
                stack.push((name, slot));
            }
            Ok(Event::Empty(e)) => {
                read_id_meta(&e, &mut id);
                open_line(&e, &mut lines, &mut annotations);
            }
            Ok(Event::End(e)) => {
                // Close back to the nearest matching element; stray end tags are ignored
                let name = e.local_name();
                if let Some(pos) = stack
                    .iter()
                    .rposition(|(open, _)| open.eq_ignore_ascii_case(name.as_ref()))
                {
                    stack.truncate(pos);
                }
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .unwrap_or_else(|_| String::from_utf8_lossy(&t).into_owned().into());
                append_text(&mut lines, &stack, &text);
                if stack.iter().any(|(name, _)| name == b"title") {
                    title.push_str(&text);
                }
            }
            Ok(Event::CData(c)) => {
                let text = String::from_utf8_lossy(&c);
                append_text(&mut lines, &stack, &text);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!(
                    "HTML import stopped at byte {}: {} ({} lines read)",
                    reader.buffer_position(),
                    e,
                    lines.len()
                );
                break;
            }
            _ => {}
        }
    }

    let title = title.trim();
    let title = if title.is_empty() { DEFAULT_TITLE } else { title };

    let mut doc = Document::from_parts(title.to_string(), lines, annotations);
    if let Some(id) = id {
        doc.id = id;
    }
    log::debug!(
        "Imported {} lines ({} annotated) from HTML",
        doc.len(),
        doc.annotation_count()
    );
    doc
}

fn is_void(name: &[u8]) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

fn append_text(lines: &mut [String], stack: &[(Vec<u8>, Option<usize>)], text: &str) {
    for slot in stack.iter().filter_map(|&(_, slot)| slot) {
        lines[slot].push_str(text);
    }
}

/// Reserve a line slot if `e` is marked as a line
fn open_line(
    e: &BytesStart,
    lines: &mut Vec<String>,
    annotations: &mut Vec<(usize, String)>,
) -> Option<usize> {
    let note = line_marker(e)?;
    let slot = lines.len();
    lines.push(String::new());
    if let Some(note) = note {
        annotations.push((slot, note));
    }
    Some(slot)
}

fn attr_value(e: &BytesStart, key: &str) -> Option<String> {
    e.html_attributes()
        .filter_map(Result::ok)
        .find(|a| a.key.as_ref().eq_ignore_ascii_case(key.as_bytes()))
        .map(|a| {
            a.unescape_value()
                .map(Cow::into_owned)
                .unwrap_or_else(|_| String::from_utf8_lossy(&a.value).into_owned())
        })
}

/// `None` if the element is not a line, otherwise its note (if any)
fn line_marker(e: &BytesStart) -> Option<Option<String>> {
    let class = attr_value(e, "class")?;
    if !class.split_ascii_whitespace().any(|c| c == LINE_CLASS) {
        return None;
    }
    Some(attr_value(e, ANNOTATION_ATTR))
}

fn read_id_meta(e: &BytesStart, id: &mut Option<Uuid>) {
    if !e.local_name().as_ref().eq_ignore_ascii_case(b"meta") {
        return;
    }
    if attr_value(e, "name").as_deref() != Some(ID_META) {
        return;
    }
    if let Some(content) = attr_value(e, "content") {
        match Uuid::parse_str(content.trim()) {
            Ok(parsed) => *id = Some(parsed),
            Err(err) => log::debug!("Ignoring invalid document id {:?}: {}", content, err),
        }
    }
}
