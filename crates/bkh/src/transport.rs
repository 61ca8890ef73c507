//! 📡 Transports — the layer that actually talks to the outside world.
//!
//! 🎬 COLD OPEN — INT. NETWORK CLOSET — 3:47 AM
//!
//! The payload is rendered. The buffer is full of hope. Between here and the
//! cluster: DNS, TCP, TLS, a load balancer with opinions, and — if this is a
//! managed domain — four signed headers that must be EXACTLY right or the
//! whole conversation ends in a 403 with no further comment.
//!
//! This module is the diplomatic corps. It normalizes the body, applies
//! whatever auth the descriptor demanded, measures the round trip with a
//! wall clock, and reports back a [`TransportResult`] no matter which wire it
//! used.
//!
//! 🧠 Knowledge graph:
//! - [`http::HttpTransport`] — reqwest underneath; dispatches on [`AuthMethod`]
//!   (SigV4 signing / basic auth / nothing-and-no-cert-checks).
//! - [`sqs::SqsTransport`] — publishes the payload as one queue message.
//! - Both return [`TransportResult`]. Non-2xx is a RESULT, not an error —
//!   the status code goes back to the caller for inspection, not up a panic.
//! - Nothing in here retries. Ever. Retry is a caller decision. 🦆

use std::time::Duration;

pub mod http;
pub mod sqs;

pub use http::HttpTransport;
pub use sqs::SqsTransport;

use crate::errors::TransportError;

/// 📊 What every send reports, regardless of which wire carried it.
#[derive(Debug, Clone)]
pub struct TransportResult {
    /// The response status. Non-2xx lands here too — inspect it, don't catch it.
    pub status: u16,
    /// Raw response text, untouched. Parse it or grep it, your call.
    pub body_text: String,
    /// Wall-clock seconds around the network call only. Remote time, not CPU time.
    pub took_s: f64,
    /// Request body bytes as sent, post-normalization.
    pub size: usize,
}

impl TransportResult {
    /// ✅ Convenience: was the status in the 2xx family?
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// 🔧 Client timeouts: 10s to shake hands, 30s for the response. Bulk requests
// can be meaty; connections that can't even say hello in 10s are having a bad
// time we don't want to share.
pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// 🔤 Resolve an HTTP verb, case-insensitively, from the short list we honor.
///
/// Anything else is [`TransportError::UnsupportedMethod`] — better a loud error
/// here than a creative verb reaching a production cluster.
pub(crate) fn parse_method(method: &str) -> Result<reqwest::Method, TransportError> {
    match method.to_ascii_uppercase().as_str() {
        "GET" => Ok(reqwest::Method::GET),
        "PUT" => Ok(reqwest::Method::PUT),
        "POST" => Ok(reqwest::Method::POST),
        "DELETE" => Ok(reqwest::Method::DELETE),
        "HEAD" => Ok(reqwest::Method::HEAD),
        _ => Err(TransportError::UnsupportedMethod(method.to_string())),
    }
}

/// 🔧 Request-body hygiene: empty stays empty; anything else must end in `\n`
/// because the bulk wire format is newline-terminated and the last line counts.
pub(crate) fn normalize_body(body: &str) -> String {
    if body.is_empty() || body.ends_with('\n') {
        body.to_string()
    } else {
        let mut normalized = String::with_capacity(body.len() + 1);
        normalized.push_str(body);
        normalized.push('\n');
        normalized
    }
}
