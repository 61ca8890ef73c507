//! 📇 Descriptors — immutable descriptions of where the documents are going.
//!
//! 🎬 COLD OPEN — INT. OPEN-PLAN OFFICE — 3:47 AM
//!
//! The whiteboard says "just point it at the cluster." Nobody wrote down WHICH
//! cluster. Or which index. Or whether the index name carries a date suffix, or
//! whether this particular dinosaur of a deployment still wants `_type` in its
//! control lines. The whiteboard has been wrong before. The whiteboard will be
//! wrong again.
//!
//! A descriptor is the anti-whiteboard: one immutable value that answers every
//! "where does this go and how do I address it" question — base URL, index
//! naming rule, wire-format vintage, auth method. Build it once, validate it at
//! the door, pass it around by reference forever after.
//!
//! 🧠 Knowledge graph:
//! - [`EsDescriptor`] — an Elasticsearch endpoint + index naming rule + [`AuthMethod`]
//! - [`SqsDescriptor`] — a queue URL + region (queue payloads carry no control lines)
//! - [`SinkDescriptor`] — the closed enum the sink factory dispatches on
//! - URL builders and the `_bulk` control line live HERE because every byte of
//!   that information is already here. Duplicating it downstream is how you get
//!   two sources of truth and zero sources of correctness.
//!
//! "He who hardcodes the endpoint in the constructor, migrates only once."
//!   — Ancient proverb, found taped to a decommissioned rack 🦆

use chrono::{DateTime, Utc};
use chrono_tz::America::Los_Angeles;
use chrono_tz::Tz;

use crate::errors::ConfigError;

/// 🕰️ The one timezone used for timestamped index suffixes, no matter where the
/// producer or the cluster runs. Index rollover follows this clock and no other,
/// so two producers on different continents agree on today's index name.
const REFERENCE_TZ: Tz = Los_Angeles;

/// 🔒 How requests to the endpoint get authenticated.
///
/// A single-choice enum on purpose: "signed AND basic auth" is not a
/// configuration mistake we detect, it is a state that cannot be written down.
/// The transport dispatches on this with a `match`, no trait hierarchy, no
/// virtual anything.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthMethod {
    /// 🚪 No auth at all. The transport also stops verifying TLS certificates in
    /// this mode — the assumption is a local cluster with a self-signed cert,
    /// not the open internet. Know what you're pointing at.
    NoAuth,
    /// 🖋️ AWS SigV4 request signing for managed domains. The region is required
    /// and non-empty — the signature is cooked with it.
    SigV4 { region: String },
    /// 🔑 HTTP basic auth. The bouncer checks a username and password.
    HttpBasic { username: String, password: String },
}

/// 🏷️ The index-naming rule half of an [`EsDescriptor`].
///
/// - `typed` selects the legacy control-line format that embeds `_type`
///   (pre-7 clusters). `doc_type` must be present when it's set.
/// - `timestamped` appends `-YYYY.MM.DD` (reference timezone) to the index
///   name, the classic daily-rollover naming scheme for log-shaped data.
#[derive(Debug, Clone)]
pub struct IndexSpec {
    pub index: String,
    pub doc_type: Option<String>,
    pub typed: bool,
    pub timestamped: bool,
}

impl IndexSpec {
    /// 📇 Modern, untyped index spec. No `_type`, no date suffix. The default vibe.
    pub fn untyped(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            doc_type: None,
            typed: false,
            timestamped: false,
        }
    }

    /// 🦖 Legacy typed index spec, for clusters that still want `_type` in the
    /// control line.
    pub fn typed(index: impl Into<String>, doc_type: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            doc_type: Some(doc_type.into()),
            typed: true,
            timestamped: false,
        }
    }

    /// 🕰️ Turn on the `-YYYY.MM.DD` suffix. Daily indices, the log-shipper special.
    pub fn with_timestamping(mut self) -> Self {
        self.timestamped = true;
        self
    }
}

/// 📇 Description of an Elasticsearch sink target.
///
/// Immutable once built. `new` is the only door in, and it checks IDs:
/// - SigV4 with an empty region → [`ConfigError::MissingRegion`]
/// - typed control lines without a `doc_type` → [`ConfigError::MissingDocType`]
///
/// The base URL is normalized to end with `/` so URL composition downstream is
/// string concatenation and nothing smarter. One slash of difference, infinite
/// suffering of difference.
#[derive(Debug, Clone)]
pub struct EsDescriptor {
    base_url: String,
    spec: IndexSpec,
    auth: AuthMethod,
}

impl EsDescriptor {
    /// 🏗️ Validate and build. This is where bad descriptors go to be rejected,
    /// loudly, before they can waste anyone's 3am.
    pub fn new(
        base_url: impl Into<String>,
        spec: IndexSpec,
        auth: AuthMethod,
    ) -> Result<Self, ConfigError> {
        if let AuthMethod::SigV4 { region } = &auth {
            if region.trim().is_empty() {
                return Err(ConfigError::MissingRegion);
            }
        }
        if spec.typed && spec.doc_type.is_none() {
            return Err(ConfigError::MissingDocType);
        }

        // 🔧 Slash hygiene: `https://host//idx` and `https://hostidx` are both
        // real failure modes people have paged each other over.
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            base_url,
            spec,
            auth,
        })
    }

    /// 🔒 The configured auth method. The transport matches on this.
    pub fn auth(&self) -> &AuthMethod {
        &self.auth
    }

    /// 📡 The slash-terminated base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 🏷️ Whether index names carry the daily date suffix.
    pub fn timestamped(&self) -> bool {
        self.spec.timestamped
    }

    /// 📇 The index name requests should address right now.
    ///
    /// Timestamped specs get `-YYYY.MM.DD` rendered in the reference timezone,
    /// evaluated at call time. Untimestamped specs return the name untouched.
    pub fn effective_index_name(&self) -> String {
        self.effective_index_name_at(Utc::now())
    }

    /// 🕰️ Same as [`effective_index_name`](Self::effective_index_name) but with
    /// an explicit instant, so tests can pin the clock instead of racing
    /// midnight.
    pub fn effective_index_name_at(&self, when: DateTime<Utc>) -> String {
        if self.spec.timestamped {
            let stamp = when.with_timezone(&REFERENCE_TZ).format("%Y.%m.%d");
            format!("{}-{}", self.spec.index, stamp)
        } else {
            self.spec.index.clone()
        }
    }

    /// 📡 `<base>/<index>/_bulk` — where the rendered buffer gets POSTed.
    pub fn bulk_url(&self) -> String {
        format!("{}{}/_bulk", self.base_url, self.effective_index_name())
    }

    /// 📡 `<base>/<index>` — the index itself, for PUT-create-with-settings and
    /// DELETE. Settings body travels separately; this is just the address.
    pub fn index_url(&self) -> String {
        format!("{}{}", self.base_url, self.effective_index_name())
    }

    /// 🔎 `<base>/<index>/_search`, with the `doc_type` segment wedged in before
    /// `_search` when the descriptor speaks the typed dialect.
    pub fn search_url(&self) -> String {
        match (self.spec.typed, &self.spec.doc_type) {
            (true, Some(doc_type)) => format!(
                "{}{}/{}/_search",
                self.base_url,
                self.effective_index_name(),
                doc_type
            ),
            _ => format!("{}{}/_search", self.base_url, self.effective_index_name()),
        }
    }

    /// 📜 The `_bulk` control line for one document, current as of this call.
    ///
    /// Strictly this is wire-format territory, not "description" territory. But
    /// every byte of information it needs lives here, and exporting the fields
    /// so someone else can format them is how drift happens.
    pub fn control_line(&self) -> String {
        self.control_line_at(Utc::now())
    }

    /// 📜 Control line with a pinned clock. The typed format is byte-for-byte
    /// stable — downstream consumers have been known to grep for it.
    pub fn control_line_at(&self, when: DateTime<Utc>) -> String {
        let index = self.effective_index_name_at(when);
        match (self.spec.typed, &self.spec.doc_type) {
            (true, Some(doc_type)) => {
                format!(r#"{{"index" : {{ "_index" : "{index}", "_type": "{doc_type}" }}}}"#)
            }
            _ => format!(r#"{{"index" : {{ "_index" : "{index}" }}}}"#),
        }
    }
}

/// ✉️ Description of an SQS sink target. A queue URL and a region — queues
/// don't do index names, and the consumers downstream add their own control
/// lines if they're feeding a bulk API.
#[derive(Debug, Clone)]
pub struct SqsDescriptor {
    queue_url: String,
    region: String,
}

impl SqsDescriptor {
    /// 🏗️ Build and validate. The SDK needs a region to find the queue at all.
    pub fn new(queue_url: impl Into<String>, region: impl Into<String>) -> Result<Self, ConfigError> {
        let region = region.into();
        if region.trim().is_empty() {
            return Err(ConfigError::MissingRegion);
        }
        Ok(Self {
            queue_url: queue_url.into(),
            region,
        })
    }

    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

/// 🎭 The many faces of a sink target — the closed enum the factory dispatches on.
///
/// Elasticsearch targets get a control-line buffer and the HTTP transport;
/// queue targets get a plain buffer and the SQS transport. There is no third
/// door, so there is no "unsupported sink" runtime error — the type system ate it.
#[derive(Debug, Clone)]
pub enum SinkDescriptor {
    Elasticsearch(EsDescriptor),
    Sqs(SqsDescriptor),
}

impl SinkDescriptor {
    /// 🏷️ A human-readable name for log lines and summaries.
    pub fn target_label(&self) -> String {
        match self {
            Self::Elasticsearch(es) => format!("index {} at {}", es.effective_index_name(), es.base_url()),
            Self::Sqs(sqs) => format!("queue {}", sqs.queue_url()),
        }
    }
}
