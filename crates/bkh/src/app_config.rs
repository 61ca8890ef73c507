//! 🔧 App Configuration — the sacred TOML-to-struct pipeline.
//!
//! 📡 "Config not found: We looked everywhere. Under the couch. Behind the fridge.
//! In the junk drawer. Nothing." — every developer at 3am 🦆
//!
//! 🏗️ Powered by Figment, because manually parsing env vars is a form of
//! self-harm that even the borrow checker wouldn't approve of.
//!
//! The wire format here is deliberately flat and forgiving — independent
//! `username` / `signed` / `region` knobs the way ops people actually write
//! them. The [`descriptor()`](EsSinkConfig::descriptor) boundary is where
//! those knobs get reconciled into one [`AuthMethod`] or rejected trying.

use anyhow::Context;
use serde::Deserialize;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use std::path::Path;
// 🚀 tracing::info — because println! in production is a cry for help.
use tracing::info;

use crate::descriptor::{AuthMethod, EsDescriptor, IndexSpec, SinkDescriptor, SqsDescriptor};
use crate::errors::ConfigError;

/// 🚰 Flush every this-many documents unless told otherwise. One thousand
/// small JSON lines is a polite bulk request, not a siege.
fn default_flush_trigger() -> usize {
    1000
}

/// 📦 The AppConfig: one struct to rule them all, one struct to find them,
/// one struct to bring them all, and in the Figment bind them.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// 📄 NDJSON input — one document per line, the whole file destined for the sink.
    pub input_file: String,
    pub sink_config: SinkConfig,
    /// 🚰 Documents per flush. Zero is refused downstream, loudly.
    #[serde(default = "default_flush_trigger")]
    pub flush_trigger: usize,
}

/// 🎭 Which sink are we feeding tonight? Externally tagged, so the TOML reads
/// `[sink_config.Elasticsearch]` or `[sink_config.Sqs]` and serde does the bouncing.
#[derive(Debug, Deserialize, Clone)]
pub enum SinkConfig {
    Elasticsearch(EsSinkConfig),
    Sqs(SqsSinkConfig),
}

impl SinkConfig {
    /// 🎯 Reconcile the wire fields into a validated descriptor.
    pub fn descriptor(&self) -> Result<SinkDescriptor, ConfigError> {
        match self {
            Self::Elasticsearch(es) => Ok(SinkDescriptor::Elasticsearch(es.descriptor()?)),
            Self::Sqs(sqs) => Ok(SinkDescriptor::Sqs(sqs.descriptor()?)),
        }
    }
}

/// 📡 The Elasticsearch sink, as ops people write it: flat fields, auth knobs
/// side by side. Reconciliation (and the fights it starts) happens in
/// [`descriptor()`](Self::descriptor).
#[derive(Debug, Deserialize, Clone)]
pub struct EsSinkConfig {
    /// 🌐 Cluster base URL, scheme and all.
    pub url: String,
    /// 🏷️ Index name — or the prefix, when `timestamped` bolts a date on.
    pub index: String,
    #[serde(default)]
    pub doc_type: Option<String>,
    /// 🦕 Legacy mapping-type mode. Old clusters only.
    #[serde(default)]
    pub typed: bool,
    /// 📅 Daily index rollover: `index-YYYY.MM.DD`.
    #[serde(default)]
    pub timestamped: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// 🖋️ SigV4 request signing. Mutually exclusive with basic auth —
    /// a request cannot serve two masters, and neither can a header.
    #[serde(default)]
    pub signed: bool,
    #[serde(default)]
    pub region: Option<String>,
}

impl EsSinkConfig {
    /// 🎯 Validate and fold the flat knobs into an [`EsDescriptor`].
    ///
    /// 💀 Rejections, in order of appearance:
    /// - `signed = true` alongside a username → [`ConfigError::ConflictingAuth`]
    /// - `signed = true` without a region → [`ConfigError::MissingRegion`]
    /// - `typed = true` without a doc_type → [`ConfigError::MissingDocType`]
    pub fn descriptor(&self) -> Result<EsDescriptor, ConfigError> {
        let auth = match (self.signed, &self.username) {
            (true, Some(_)) => return Err(ConfigError::ConflictingAuth),
            (true, None) => AuthMethod::SigV4 {
                region: self.region.clone().unwrap_or_default(),
            },
            (false, Some(username)) => AuthMethod::HttpBasic {
                username: username.clone(),
                password: self.password.clone().unwrap_or_default(),
            },
            (false, None) => AuthMethod::NoAuth,
        };

        let mut spec = match (self.typed, &self.doc_type) {
            (true, Some(doc_type)) => IndexSpec::typed(&self.index, doc_type),
            (true, None) => return Err(ConfigError::MissingDocType),
            (false, _) => IndexSpec::untyped(&self.index),
        };
        if self.timestamped {
            spec = spec.with_timestamping();
        }

        EsDescriptor::new(&self.url, spec, auth)
    }
}

/// 📬 The SQS sink: a queue URL and the region it lives in. That's the whole form.
#[derive(Debug, Deserialize, Clone)]
pub struct SqsSinkConfig {
    pub queue_url: String,
    pub region: String,
}

impl SqsSinkConfig {
    pub fn descriptor(&self) -> Result<SqsDescriptor, ConfigError> {
        SqsDescriptor::new(&self.queue_url, &self.region)
    }
}

/// 🚀 Load the config — from a file, from env vars, or from the sheer power of hoping.
///
/// 🔧 Merges environment variables (BKH_*) with an optional TOML file.
/// We don't gatekeep env vars here. This is a safe space. 🦆
///
/// 📐 DESIGN NOTE (no cap, this is tribal knowledge):
///   - If `config_file_name` is None  → env vars only. No file. No assumptions.
///   - If `config_file_name` is Some  → env vars + TOML file, merged. TOML wins on conflicts.
///
/// 💀 Returns an error if config is unparseable. Which it will be. Check the error message though —
/// it's contextual, informative, and written with love. Or despair. Hard to tell at 3am.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!(
        "🔧 Loading configuration: {:#?}",
        config_file_name.unwrap_or(Path::new(""))
    );

    // 🏗️ Start with env vars as the base layer — like a good sourdough starter.
    let config = Figment::new().merge(Env::prefixed("BKH_"));

    // 🎯 Conditionally layer in TOML only if a file was actually provided.
    // No file? No problem. We trust the env. Like a golden retriever trusts everyone.
    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables (BKH_*). \
             The file exists in our hearts, but apparently not on disk.",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables (BKH_*). \
                 No file was provided — this one's all on the environment. Classic."
            .to_string(),
    };

    // ✅ or 💀, there is no try — actually there is, it's called `?`
    config.extract().context(context_msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn write_test_config(contents: &str) -> std::path::PathBuf {
        let timestamp_of_questionable_life_choices = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("💀 Clock went backwards. Time is a flat bug report.")
            .as_nanos();
        let temp_path = std::env::temp_dir().join(format!(
            "bkh_app_config_{timestamp_of_questionable_life_choices}.toml"
        ));

        // 🧪 We write a real file here because Figment wants TOML from disk, like it's method acting.
        fs::write(&temp_path, contents)
            .expect("💀 Failed to write test config. The filesystem said 'new phone who dis'.");
        temp_path
    }

    #[test]
    fn the_one_where_a_full_es_config_parses_end_to_end() {
        let config_path = write_test_config(
            r#"
            input_file = "events.ndjson"
            flush_trigger = 250

            [sink_config.Elasticsearch]
            url = "https://search.example.com"
            index = "logs"
            timestamped = true
            username = "admin"
            password = "hunter2"
            "#,
        );

        let app_config = load_config(Some(config_path.as_path()))
            .expect("💀 A perfectly reasonable config should parse. Figment, explain yourself.");

        assert_eq!(app_config.input_file, "events.ndjson");
        assert_eq!(app_config.flush_trigger, 250);
        let descriptor = match &app_config.sink_config {
            SinkConfig::Elasticsearch(es) => es.descriptor().expect("valid descriptor"),
            honestly_who_knows => panic!(
                "💀 Expected an Elasticsearch sink, but serde took us to {:?}. Plot twist energy.",
                honestly_who_knows
            ),
        };
        assert!(descriptor.timestamped());
        assert!(matches!(
            descriptor.auth(),
            AuthMethod::HttpBasic { username, .. } if username == "admin"
        ));

        fs::remove_file(config_path)
            .expect("💀 Failed to remove test config. Even the trash has trust issues.");
    }

    #[test]
    fn the_one_where_flush_trigger_defaults_show_up_uninvited_but_helpful() {
        let config_path = write_test_config(
            r#"
            input_file = "events.ndjson"

            [sink_config.Elasticsearch]
            url = "http://localhost:9200"
            index = "logs"
            "#,
        );

        let app_config: AppConfig = Figment::new()
            .merge(Toml::file(config_path.as_path()))
            .extract()
            .expect("💀 Default flush trigger should exist. Serde left us on read otherwise.");

        assert_eq!(app_config.flush_trigger, 1000);

        fs::remove_file(config_path)
            .expect("💀 Failed to remove test config. The janitor quit mid-scene.");
    }

    #[test]
    fn the_one_where_signed_plus_basic_auth_starts_a_fight_we_refuse_to_host() {
        let config = EsSinkConfig {
            url: "https://search.example.com".into(),
            index: "logs".into(),
            doc_type: None,
            typed: false,
            timestamped: false,
            username: Some("admin".into()),
            password: Some("hunter2".into()),
            signed: true,
            region: Some("us-west-2".into()),
        };

        assert!(matches!(
            config.descriptor(),
            Err(ConfigError::ConflictingAuth)
        ));
    }

    #[test]
    fn the_one_where_signed_mode_demands_a_region() {
        let config = EsSinkConfig {
            url: "https://search.example.com".into(),
            index: "logs".into(),
            doc_type: None,
            typed: false,
            timestamped: false,
            username: None,
            password: None,
            signed: true,
            region: None,
        };

        assert!(matches!(
            config.descriptor(),
            Err(ConfigError::MissingRegion)
        ));
    }

    #[test]
    fn the_one_where_the_sqs_side_of_the_family_also_parses() {
        let config_path = write_test_config(
            r#"
            input_file = "events.ndjson"

            [sink_config.Sqs]
            queue_url = "https://sqs.us-east-1.amazonaws.com/123456789012/ingest"
            region = "us-east-1"
            "#,
        );

        let app_config = load_config(Some(config_path.as_path()))
            .expect("💀 The queue config should parse. SQS deserves love too.");

        let descriptor = app_config
            .sink_config
            .descriptor()
            .expect("valid descriptor");
        assert!(matches!(descriptor, SinkDescriptor::Sqs(_)));

        fs::remove_file(config_path)
            .expect("💀 Failed to remove test config. The janitor quit mid-scene.");
    }
}
