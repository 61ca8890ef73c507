//! 📜 The control-line buffer — `_bulk` format, two lines per document.
//!
//! Every appended document gets a freshly computed control line in front of it,
//! so the buffer's contents are always a valid `_bulk` body: render, POST,
//! done. No assembly required at flush time.

use serde_json::Value;

use crate::buffers::{encode_value, render_lines, LineBuffer};
use crate::descriptor::EsDescriptor;

/// 📜 Buffers documents alternating with their `_bulk` control lines.
///
/// Invariant: the line count is always even, and `doc_count() == lines / 2`.
///
/// ⚠️ The control line is computed at APPEND time, per document. With a
/// timestamped index, a buffer that straddles the daily rollover will address
/// two different indices within one flush — each document lands in the index
/// that was current when it was added.
#[derive(Debug)]
pub struct BulkLineBuffer {
    descriptor: EsDescriptor,
    lines: Vec<String>,
}

impl BulkLineBuffer {
    /// 🏗️ A fresh, empty buffer addressing whatever the descriptor describes.
    pub fn new(descriptor: EsDescriptor) -> Self {
        Self {
            descriptor,
            lines: Vec::new(),
        }
    }
}

impl LineBuffer for BulkLineBuffer {
    fn add_value(&mut self, doc: &Value) {
        // 📥 Unserializable documents are dropped inside encode_value —
        // crucially BEFORE the control line goes in, so the even-line invariant
        // holds no matter what.
        if let Some(line) = encode_value(doc) {
            self.add_raw(line);
        }
    }

    fn add_raw(&mut self, line: String) {
        self.lines.push(self.descriptor.control_line());
        self.lines.push(line);
    }

    fn doc_count(&self) -> usize {
        self.lines.len() / 2
    }

    fn docs_only(&self) -> String {
        // 📜 Documents sit at the odd indices; the chaperones sit at the even ones.
        let docs: Vec<String> = self
            .lines
            .iter()
            .skip(1)
            .step_by(2)
            .cloned()
            .collect();
        render_lines(&docs)
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
