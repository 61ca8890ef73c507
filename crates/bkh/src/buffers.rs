//! 📦 Line buffers — where documents wait, in order, for their flush.
//!
//! 🎬 *[a document arrives. the buffer assigns it a line. and, if the target
//! is a bulk API, a chaperone — the control line that says where it's going.]*
//!
//! 🧠 Knowledge graph:
//! - [`LineBuffer`] — the contract: append, count, render, clear. Never remove
//!   a single element; the buffer only grows or resets.
//! - [`bulk::BulkLineBuffer`] — lines alternate `[control, doc, control, doc]`,
//!   ready for `_bulk`. Document count is half the line count.
//! - [`plain::PlainLineBuffer`] — documents only, for queue targets whose
//!   downstream consumers add their own control lines.
//! - [`LineBufferKind`] — the enum dispatcher, same pattern as the transports.
//!
//! ⚠️ A structured document that refuses to serialize is DROPPED with a `warn!`,
//! not raised. One cursed document does not take down an ingestion run. The 🦆
//! accepts this tradeoff and so must you.

use serde_json::Value;
use tracing::warn;

pub mod bulk;
pub mod plain;

pub use bulk::BulkLineBuffer;
pub use plain::PlainLineBuffer;

/// 📦 The buffering contract both variants implement.
///
/// # Contract
/// - `add_value` / `add_raw` append in insertion order. That order is the wire
///   order; nothing downstream re-sorts.
/// - `render()` is the full wire payload: every line joined with `\n` plus a
///   trailing `\n` (the bulk API requires the terminator). Empty buffer renders
///   an empty string.
/// - `docs_only()` is the same thing with control lines stripped — for plain
///   buffers the two are identical.
/// - `clear()` resets to empty. It does NOT flush first. Flush first.
pub trait LineBuffer {
    /// 📥 Append a structured document. Serialized to one JSON line on the way
    /// in; a document that can't be serialized is dropped with a diagnostic.
    fn add_value(&mut self, doc: &Value);
    /// 📥 Append a pre-serialized line, verbatim. We trust it's one line of
    /// valid JSON. We have to trust something.
    fn add_raw(&mut self, line: String);
    /// 🔢 How many documents (not lines) are waiting.
    fn doc_count(&self) -> usize;
    /// 📜 Only the document lines, newline-joined with a trailing `\n`.
    fn docs_only(&self) -> String;
    /// 📜 The full wire payload, control lines included where applicable.
    fn render(&self) -> String;
    /// 🗑️ Back to empty. No flush happens here. None. Read that again.
    fn clear(&mut self);
    /// 📊 Total payload bytes as `render()` would produce them, counted without
    /// actually rendering.
    fn byte_size(&self) -> usize;
}

/// 🔧 Serialize one structured document to its wire line.
///
/// Returns `None` (after a `warn!`) when serde refuses — a non-string map key,
/// a NaN float, that kind of guest. The caller skips the document and the run
/// keeps moving.
pub(crate) fn encode_value(doc: &Value) -> Option<String> {
    match serde_json::to_string(doc) {
        Ok(line) => Some(line),
        Err(err) => {
            warn!("📦 dropping unserializable document: {err}");
            None
        }
    }
}

/// 🎭 The many faces of a line buffer — dispatched with a match, monomorphic
/// underneath, no vtable invited.
#[derive(Debug)]
pub enum LineBufferKind {
    Bulk(BulkLineBuffer),
    Plain(PlainLineBuffer),
}

impl LineBuffer for LineBufferKind {
    fn add_value(&mut self, doc: &Value) {
        match self {
            Self::Bulk(b) => b.add_value(doc),
            Self::Plain(b) => b.add_value(doc),
        }
    }

    fn add_raw(&mut self, line: String) {
        match self {
            Self::Bulk(b) => b.add_raw(line),
            Self::Plain(b) => b.add_raw(line),
        }
    }

    fn doc_count(&self) -> usize {
        match self {
            Self::Bulk(b) => b.doc_count(),
            Self::Plain(b) => b.doc_count(),
        }
    }

    fn docs_only(&self) -> String {
        match self {
            Self::Bulk(b) => b.docs_only(),
            Self::Plain(b) => b.docs_only(),
        }
    }

    fn render(&self) -> String {
        match self {
            Self::Bulk(b) => b.render(),
            Self::Plain(b) => b.render(),
        }
    }

    fn clear(&mut self) {
        match self {
            Self::Bulk(b) => b.clear(),
            Self::Plain(b) => b.clear(),
        }
    }

    fn byte_size(&self) -> usize {
        match self {
            Self::Bulk(b) => b.byte_size(),
            Self::Plain(b) => b.byte_size(),
        }
    }
}

/// 🔧 Shared rendering: join lines with `\n`, trailing `\n` included, empty
/// stays empty. Both variants lean on this so the terminator rule lives once.
pub(crate) fn render_lines(lines: &[String]) -> String {
    if lines.is_empty() {
        return String::new();
    }
    // 🧮 Pre-allocate: every line plus its newline. Exact, not vibes.
    let capacity: usize = lines.iter().map(|l| l.len() + 1).sum();
    let mut payload = String::with_capacity(capacity);
    for line in lines {
        payload.push_str(line);
        payload.push('\n');
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn the_one_where_rendering_no_lines_produces_no_bytes() {
        assert_eq!(render_lines(&[]), "");
    }

    #[test]
    fn the_one_where_every_line_gets_a_newline_even_the_last() {
        let lines = vec!["a".to_string(), "b".to_string()];
        assert_eq!(render_lines(&lines), "a\nb\n");
    }

    #[test]
    fn the_one_where_well_behaved_documents_encode_to_one_line() {
        let line = encode_value(&json!({"field1": "value1"})).expect("plain objects serialize");
        assert_eq!(line, r#"{"field1":"value1"}"#);
        assert!(!line.contains('\n'), "wire lines must be single lines");
    }
}
