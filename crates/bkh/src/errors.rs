//! 💀 Errors — the taxonomy of everything that can go wrong before 3am does.
//!
//! 🎬 *[a descriptor walks into a constructor. the constructor checks its ID.]*
//! *["Signed requests, no region?" the constructor says. "Not in my house."]*
//!
//! Three families, three blast radii:
//! - [`ConfigError`] — you held it wrong at construction time. Fatal to the instance.
//! - [`TransportError`] — the network (or AWS) said no. Fatal to the call, not the buffer.
//! - [`SinkError`] — the umbrella for factory-level failures, because the factory
//!   can trip over either of the above while wiring things up.
//!
//! ⚠️ Non-2xx HTTP statuses are NOT errors here. They come back as results with a
//! status code, and the caller gets to have feelings about them. Connection refused
//! is an error. A 429 is just Tuesday. 🦆

use thiserror::Error;

/// 🔧 Invalid sink description, caught at construction. There is no recovering
/// this instance; fix the config and try again.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 🖋️ SigV4 signing needs to know which region's kitchen it's cooking in.
    #[error("signed requests require a non-empty region")]
    MissingRegion,

    /// 🏷️ Typed control lines embed a `_type`, so the descriptor must carry one.
    #[error("typed control-line format requires a doc_type")]
    MissingDocType,

    /// 🔒 Signed requests and HTTP basic auth at the same time. Pick a lane.
    #[error("cannot configure both SigV4 signing and HTTP basic auth")]
    ConflictingAuth,

    /// 🗑️ A flush trigger of zero would flush on a buffer with nothing in it. Forever.
    #[error("flush_trigger must be greater than zero")]
    ZeroFlushTrigger,
}

/// 📡 Transport-level failure. The buffer survives these — documents stay put
/// and the caller decides whether to retry the flush, drop the data, or abort.
#[derive(Debug, Error)]
pub enum TransportError {
    /// 💀 We only speak GET, PUT, POST, DELETE, and HEAD. "BREW" is not a verb here.
    #[error("'{0}' is not a recognized HTTP method")]
    UnsupportedMethod(String),

    /// 📡 reqwest failed to complete the round trip — DNS, TCP, TLS, timeouts,
    /// all the usual suspects in the network lineup.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// 🔑 The credential provider came back empty-handed.
    #[error("could not resolve signing credentials: {0}")]
    Credentials(String),

    /// 🖋️ SigV4 signing fell over. Usually a malformed URL or a clock from another dimension.
    #[error("request signing failed: {0}")]
    Signing(String),

    /// ✉️ The queue declined our lovingly serialized payload.
    #[error("queue publish failed: {0}")]
    Queue(String),
}

/// 🚰 Umbrella error for building a sink: either the descriptor was bad or the
/// transport could not be stood up.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}
