//! 🎬 bulkhead — buffered bulk ingestion for Elasticsearch and SQS.
//!
//! *[narrator voice]* "Nobody ever got paged for sending one well-formed
//! bulk request. They got paged for sending forty thousand tiny ones."
//!
//! The shape of the thing:
//! - [`descriptor`] knows WHERE documents go (URLs, index names, auth).
//! - [`buffers`] knows HOW they queue up (bulk control lines, or plain lines).
//! - [`transport`] knows HOW they travel (signed, basic-auth'd, or bare HTTP —
//!   or an SQS queue).
//! - [`sink`] glues the three together and pulls the flush lever.
//! - [`run`] is the whole pipeline: file in, cluster out, summary back. 🦆

pub mod app_config;
pub mod buffers;
pub mod credentials;
pub mod descriptor;
pub mod errors;
pub mod sink;
pub mod transport;

use std::time::Instant;

use anyhow::{Context, Result};
use tokio::io::AsyncBufReadExt;
use tracing::{info, warn};

use crate::app_config::AppConfig;
use crate::sink::FlushingBuffer;

/// 🧾 The receipt: what one end-to-end run actually moved.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Documents that made it into the sink.
    pub docs: usize,
    /// Flushes that went out (auto + final drain).
    pub flushes: usize,
    /// Payload bytes shipped across all flushes.
    pub bytes: usize,
    /// Malformed input lines we dropped with a warning.
    pub skipped: usize,
    /// Wall-clock seconds, soup to nuts.
    pub elapsed_s: f64,
}

/// 🚀 The pipeline: stream the NDJSON input through a flushing sink, drain
/// whatever's left at the end, hand back the receipt.
///
/// 💀 Errors out on: invalid sink config, an unreadable input file, or a
/// transport that never completed a request. A flush the far end REJECTED
/// (non-2xx) is also fatal here — the buffer kept the documents, but a
/// one-shot file run has no second attempt to offer them.
pub async fn run(config: AppConfig) -> Result<RunSummary> {
    let started = Instant::now();

    let descriptor = config
        .sink_config
        .descriptor()
        .context("💀 The sink config fields don't add up to a valid target. Re-read the TOML slowly.")?;
    let mut sink = FlushingBuffer::for_descriptor(descriptor, config.flush_trigger)
        .await
        .context("💀 Couldn't stand up the sink. The factory has opinions and they were negative.")?;

    let file = tokio::fs::File::open(&config.input_file)
        .await
        .with_context(|| {
            format!(
                "💀 Couldn't open input file '{}'. It was there a minute ago, I swear.",
                config.input_file
            )
        })?;
    let mut lines = tokio::io::BufReader::new(file).lines();

    let mut docs = 0usize;
    let mut flushes = 0usize;
    let mut bytes = 0usize;
    let mut skipped = 0usize;

    while let Some(line) = lines
        .next_line()
        .await
        .context("💀 Reading the input file went sideways mid-stream.")?
    {
        if line.trim().is_empty() {
            continue;
        }

        // 📥 Parse before buffering — a line that isn't JSON would poison the
        // whole bulk payload, and the cluster rejects payloads wholesale.
        let doc: serde_json::Value = match serde_json::from_str(&line) {
            Ok(doc) => doc,
            Err(err) => {
                warn!("🚨 skipping malformed input line: {}", err);
                skipped += 1;
                continue;
            }
        };

        docs += 1;
        if let Some(result) = sink
            .add_value(&doc)
            .await
            .context("💀 A flush never completed. Check the network, then check it again.")?
        {
            record_flush(&result, &mut flushes, &mut bytes)?;
        }
    }

    // 🚽 Final drain — the stragglers ride out here or not at all.
    if let Some(result) = sink
        .flush()
        .await
        .context("💀 The final drain flush never completed. So close.")?
    {
        record_flush(&result, &mut flushes, &mut bytes)?;
    }

    let summary = RunSummary {
        docs,
        flushes,
        bytes,
        skipped,
        elapsed_s: started.elapsed().as_secs_f64(),
    };
    info!(
        "✅ run complete: {} docs, {} flushes, {} bytes, {} skipped, {:.3}s",
        summary.docs, summary.flushes, summary.bytes, summary.skipped, summary.elapsed_s
    );
    Ok(summary)
}

fn record_flush(
    result: &crate::sink::FlushResult,
    flushes: &mut usize,
    bytes: &mut usize,
) -> Result<()> {
    if !result.is_success() {
        anyhow::bail!(
            "💀 The sink rejected a flush of {} docs with status {}: {}",
            result.docs_flushed,
            result.status,
            result.body_text
        );
    }
    *flushes += 1;
    *bytes += result.size;
    Ok(())
}
