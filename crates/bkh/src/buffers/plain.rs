//! ✉️ The plain buffer — documents only, no control lines.
//!
//! Queue targets carry documents without `_bulk` framing; whoever drains the
//! queue adds control lines on their side of the fence. One line per document,
//! `doc_count == line count`, nothing clever.

use serde_json::Value;

use crate::buffers::{encode_value, render_lines, LineBuffer};

/// ✉️ Document lines, in insertion order, and nothing else.
#[derive(Debug, Default)]
pub struct PlainLineBuffer {
    lines: Vec<String>,
}

impl PlainLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LineBuffer for PlainLineBuffer {
    fn add_value(&mut self, doc: &Value) {
        if let Some(line) = encode_value(doc) {
            self.lines.push(line);
        }
    }

    fn add_raw(&mut self, line: String) {
        self.lines.push(line);
    }

    fn doc_count(&self) -> usize {
        self.lines.len()
    }

    fn docs_only(&self) -> String {
        // ✉️ No control lines to strip — docs_only IS the payload here.
        self.render()
    }

    fn render(&self) -> String {
        render_lines(&self.lines)
    }

    fn clear(&mut self) {
        self.lines.clear();
    }

    fn byte_size(&self) -> usize {
        self.lines.iter().map(|l| l.len() + 1).sum()
    }
}
