//! 🚰 The flushing sink — where buffering and transport finally meet.
//!
//! A [`FlushingBuffer`] holds a line buffer and a transport and watches the
//! document count. Hit the flush trigger and the whole payload ships in one
//! request; the buffer clears only if the trip succeeded, so a flaky network
//! costs a retry, never data.
//!
//! 🦆 The sink duck's entire job is knowing when the bathtub is full.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::buffers::{BulkLineBuffer, LineBuffer, LineBufferKind, PlainLineBuffer};
use crate::credentials::CredentialsProvider;
use crate::descriptor::{EsDescriptor, SinkDescriptor};
use crate::errors::{ConfigError, SinkError, TransportError};
use crate::transport::{HttpTransport, SqsTransport, TransportResult};

/// 🧾 What one flush accomplished.
#[derive(Debug, Clone)]
pub struct FlushResult {
    /// HTTP status (or the synthesized 200 a queue hands back).
    pub status: u16,
    /// Response body. Empty for queues, which have none to offer.
    pub body_text: String,
    /// Wall-clock seconds spent on the wire.
    pub took_s: f64,
    /// Payload bytes shipped.
    pub size: usize,
    /// Documents that left the building.
    pub docs_flushed: usize,
}

impl FlushResult {
    fn from_transport(result: TransportResult, docs_flushed: usize) -> Self {
        Self {
            status: result.status,
            body_text: result.body_text,
            took_s: result.took_s,
            size: result.size,
            docs_flushed,
        }
    }

    /// ✅ Did the receiving end say yes?
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 🎭 The wired-up ends a sink can flush into. Same match-dispatch arrangement
/// as [`LineBufferKind`] — two concrete shapes, zero trait objects. Each
/// variant carries exactly what its flush needs, so a transport can never be
/// holding the wrong kind of address.
#[derive(Debug)]
enum SinkTarget {
    Es {
        descriptor: EsDescriptor,
        transport: HttpTransport,
    },
    Queue { transport: SqsTransport },
}

/// 🚰 A line buffer that ships itself when it gets full.
#[derive(Debug)]
pub struct FlushingBuffer {
    target: SinkTarget,
    buffer: LineBufferKind,
    flush_trigger: usize,
}

impl FlushingBuffer {
    /// 🏭 The factory: hand it a descriptor, get back a sink wired with the
    /// matching buffer and transport.
    ///
    /// Elasticsearch descriptors get a bulk buffer (control lines interleaved)
    /// over HTTP; SQS descriptors get a plain buffer over the queue client.
    pub async fn for_descriptor(
        descriptor: SinkDescriptor,
        flush_trigger: usize,
    ) -> Result<Self, SinkError> {
        Self::build(descriptor, flush_trigger, None).await
    }

    /// 🏭 Factory with an injected credential provider for the signed path —
    /// tests and callers with their own credential plumbing come in this door.
    /// Ignored for targets that never sign (basic auth, no auth, queues).
    pub async fn with_credentials(
        descriptor: SinkDescriptor,
        flush_trigger: usize,
        credentials: Arc<dyn CredentialsProvider>,
    ) -> Result<Self, SinkError> {
        Self::build(descriptor, flush_trigger, Some(credentials)).await
    }

    async fn build(
        descriptor: SinkDescriptor,
        flush_trigger: usize,
        credentials: Option<Arc<dyn CredentialsProvider>>,
    ) -> Result<Self, SinkError> {
        if flush_trigger == 0 {
            // 🚨 A trigger of zero means "flush before you buffer", which is a
            // contradiction, not a configuration.
            return Err(ConfigError::ZeroFlushTrigger.into());
        }

        info!(
            "🚰 sink ready: flush every {} docs to {}",
            flush_trigger,
            descriptor.target_label()
        );

        let (buffer, target) = match descriptor {
            SinkDescriptor::Elasticsearch(es) => {
                let transport = match credentials {
                    Some(provider) => HttpTransport::with_credentials(&es, provider)?,
                    None => HttpTransport::new(&es)?,
                };
                (
                    LineBufferKind::Bulk(BulkLineBuffer::new(es.clone())),
                    SinkTarget::Es {
                        transport,
                        descriptor: es,
                    },
                )
            }
            SinkDescriptor::Sqs(sqs) => (
                LineBufferKind::Plain(PlainLineBuffer::default()),
                SinkTarget::Queue {
                    transport: SqsTransport::new(&sqs).await,
                },
            ),
        };

        Ok(Self {
            target,
            buffer,
            flush_trigger,
        })
    }

    /// 📥 Buffer a structured document, flushing if that tipped us over the
    /// trigger. `Ok(Some(_))` means a flush happened and here's how it went;
    /// `Ok(None)` means the document is parked and waiting for friends.
    pub async fn add_value(
        &mut self,
        doc: &serde_json::Value,
    ) -> Result<Option<FlushResult>, TransportError> {
        self.buffer.add_value(doc);
        self.maybe_flush().await
    }

    /// 📥 Buffer a pre-serialized line, flushing if full. Same contract as
    /// [`add_value`](Self::add_value).
    pub async fn add_raw(&mut self, line: String) -> Result<Option<FlushResult>, TransportError> {
        self.buffer.add_raw(line);
        self.maybe_flush().await
    }

    async fn maybe_flush(&mut self) -> Result<Option<FlushResult>, TransportError> {
        if self.buffer.doc_count() >= self.flush_trigger {
            self.flush().await
        } else {
            Ok(None)
        }
    }

    /// 🚽 Ship everything buffered, full or not. The drain call for shutdown.
    ///
    /// An empty buffer is a no-op `Ok(None)` — we do not send empty payloads
    /// to perfectly innocent clusters. The buffer clears only when the
    /// transport reports success; on an error OR a non-2xx status every
    /// document stays put for another attempt.
    pub async fn flush(&mut self) -> Result<Option<FlushResult>, TransportError> {
        let docs = self.buffer.doc_count();
        if docs == 0 {
            return Ok(None);
        }

        let payload = self.buffer.render();
        let result = match &self.target {
            SinkTarget::Es {
                descriptor,
                transport,
            } => {
                transport
                    .send("POST", &descriptor.bulk_url(), &payload)
                    .await?
            }
            SinkTarget::Queue { transport } => transport.publish(&payload).await?,
        };

        if result.is_success() {
            debug!(
                "🚽 flushed {} docs ({} bytes) in {:.3}s, status {}",
                docs, result.size, result.took_s, result.status
            );
            self.buffer.clear();
        } else {
            warn!(
                "🚨 flush of {} docs rejected with status {} — keeping them buffered: {}",
                docs, result.status, result.body_text
            );
        }

        Ok(Some(FlushResult::from_transport(result, docs)))
    }

    /// 🔢 Documents currently waiting.
    pub fn doc_count(&self) -> usize {
        self.buffer.doc_count()
    }

    /// 📦 Bytes the next flush would put on the wire.
    pub fn byte_size(&self) -> usize {
        self.buffer.byte_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{AuthMethod, EsDescriptor, IndexSpec, SqsDescriptor};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn es_target(server_url: &str) -> SinkDescriptor {
        SinkDescriptor::Elasticsearch(
            EsDescriptor::new(server_url, IndexSpec::untyped("logs"), AuthMethod::NoAuth)
                .expect("valid test descriptor"),
        )
    }

    const TEST_QUEUE_URL: &str = "https://sqs.us-east-1.amazonaws.com/123456789012/ingest";

    fn queue_target() -> SinkDescriptor {
        SinkDescriptor::Sqs(
            SqsDescriptor::new(TEST_QUEUE_URL, "us-east-1").expect("valid test descriptor"),
        )
    }

    // 🧪 An SQS client aimed at the mock server — fixed credentials, retries
    // off, nothing resolved from the environment.
    fn queue_client_for(endpoint: &str) -> aws_sdk_sqs::Client {
        let config = aws_sdk_sqs::Config::builder()
            .behavior_version(aws_config::BehaviorVersion::latest())
            .retry_config(aws_sdk_sqs::config::retry::RetryConfig::disabled())
            .region(aws_sdk_sqs::config::Region::new("us-east-1"))
            .credentials_provider(aws_credential_types::Credentials::new(
                "AKIATEST",
                "testsecret",
                None,
                None,
                "test",
            ))
            .endpoint_url(endpoint)
            .build();
        aws_sdk_sqs::Client::from_conf(config)
    }

    #[tokio::test]
    async fn the_one_where_the_trigger_fires_the_flush() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/logs/_bulk"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"errors":false}"#))
            .expect(1)
            .mount(&server)
            .await;

        let mut sink = FlushingBuffer::for_descriptor(es_target(&server.uri()), 3)
            .await
            .expect("factory builds");

        assert!(sink.add_value(&json!({"n": 1})).await.unwrap().is_none());
        assert!(sink.add_value(&json!({"n": 2})).await.unwrap().is_none());
        let result = sink
            .add_value(&json!({"n": 3}))
            .await
            .unwrap()
            .expect("third doc trips the trigger");

        assert_eq!(result.docs_flushed, 3);
        assert!(result.is_success());
        assert_eq!(sink.doc_count(), 0, "successful flush empties the buffer");
    }

    #[tokio::test]
    async fn the_one_where_a_partial_buffer_waits_for_the_drain_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut sink = FlushingBuffer::for_descriptor(es_target(&server.uri()), 5)
            .await
            .expect("factory builds");

        for n in 0..3 {
            assert!(sink.add_value(&json!({"n": n})).await.unwrap().is_none());
        }
        assert_eq!(sink.doc_count(), 3);
        assert!(sink.byte_size() > 0, "a waiting buffer weighs something");

        let result = sink.flush().await.unwrap().expect("drain flushes");
        assert_eq!(result.docs_flushed, 3);
        assert!(result.size > 0, "flushed payloads carry bytes");
        assert_eq!(sink.doc_count(), 0);
        assert_eq!(sink.byte_size(), 0, "a drained buffer weighs nothing");
    }

    #[tokio::test]
    async fn the_one_where_draining_an_empty_buffer_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut sink = FlushingBuffer::for_descriptor(es_target(&server.uri()), 5)
            .await
            .expect("factory builds");

        assert!(sink.flush().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn the_one_where_a_rejected_flush_keeps_the_documents() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("come back later"))
            .mount(&server)
            .await;

        let mut sink = FlushingBuffer::for_descriptor(es_target(&server.uri()), 2)
            .await
            .expect("factory builds");

        sink.add_value(&json!({"n": 1})).await.unwrap();
        let result = sink
            .add_value(&json!({"n": 2}))
            .await
            .unwrap()
            .expect("trigger fires even when the cluster sulks");

        assert_eq!(result.status, 503);
        assert!(!result.is_success());
        assert_eq!(sink.doc_count(), 2, "nothing clears on a rejection");
    }

    #[tokio::test]
    async fn the_one_where_a_dead_network_keeps_the_documents_too() {
        // 🔌 Port 1 on loopback: reserved, closed, and reliably unfriendly.
        let mut sink =
            FlushingBuffer::for_descriptor(es_target("http://127.0.0.1:1"), 2)
                .await
                .expect("factory builds");

        sink.add_value(&json!({"n": 1})).await.unwrap();
        let outcome = sink.add_value(&json!({"n": 2})).await;

        assert!(outcome.is_err(), "connection refused surfaces as an error");
        assert_eq!(sink.doc_count(), 2, "the buffer survives the outage");
    }

    #[tokio::test]
    async fn the_one_where_a_zero_trigger_is_refused_at_the_door() {
        let outcome = FlushingBuffer::for_descriptor(es_target("http://localhost:9200"), 0).await;
        assert!(matches!(
            outcome,
            Err(SinkError::Config(ConfigError::ZeroFlushTrigger))
        ));
    }

    #[tokio::test]
    async fn the_one_where_raw_lines_count_toward_the_trigger() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut sink = FlushingBuffer::for_descriptor(es_target(&server.uri()), 2)
            .await
            .expect("factory builds");

        assert!(sink.add_raw(r#"{"n":1}"#.to_string()).await.unwrap().is_none());
        let result = sink
            .add_raw(r#"{"n":2}"#.to_string())
            .await
            .unwrap()
            .expect("second raw line trips the trigger");
        assert_eq!(result.docs_flushed, 2);
    }

    #[tokio::test]
    async fn the_one_where_the_factory_pairs_queues_with_a_plain_buffer() {
        let mut sink = FlushingBuffer::for_descriptor(queue_target(), 3)
            .await
            .expect("factory builds");

        // ✉️ Plain pairing: one line per doc, no chaperones. A bulk pairing
        // would weigh the control lines too, and this math would not add up.
        assert!(sink.add_raw(r#"{"a":1}"#.to_string()).await.unwrap().is_none());
        assert!(sink.add_raw(r#"{"b":2}"#.to_string()).await.unwrap().is_none());
        assert_eq!(sink.doc_count(), 2);
        assert_eq!(sink.byte_size(), "{\"a\":1}\n{\"b\":2}\n".len());
    }

    #[tokio::test]
    async fn the_one_where_a_full_queue_sink_ships_one_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"MessageId":"msg-0001","MD5OfMessageBody":"d41d8cd98f00b204e9800998ecf8427e"}"#,
                "application/x-amz-json-1.0",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let mut sink = FlushingBuffer {
            target: SinkTarget::Queue {
                transport: SqsTransport::with_client(
                    queue_client_for(&server.uri()),
                    TEST_QUEUE_URL,
                ),
            },
            buffer: LineBufferKind::Plain(PlainLineBuffer::default()),
            flush_trigger: 2,
        };

        assert!(sink.add_value(&json!({"n": 1})).await.unwrap().is_none());
        let result = sink
            .add_value(&json!({"n": 2}))
            .await
            .unwrap()
            .expect("second doc trips the trigger");

        assert_eq!(result.status, 200);
        assert_eq!(result.docs_flushed, 2);
        assert_eq!(result.body_text, "", "queue flushes report no response body");
        assert_eq!(sink.doc_count(), 0, "delivered messages clear the buffer");
    }
}
