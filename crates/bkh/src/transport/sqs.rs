//! 📬 The SQS transport — same postal service, different mailbox.
//!
//! Where the HTTP transport talks to a search cluster, this one drops the
//! rendered payload into a queue and walks away. Auth is the SDK's problem:
//! the default credential chain (env, profile, instance role, the works)
//! resolves whoever we are today.

use std::time::Instant;

use aws_config::BehaviorVersion;
use aws_sdk_sqs::config::Region;
use tracing::debug;

use crate::descriptor::SqsDescriptor;
use crate::errors::TransportError;
use crate::transport::{normalize_body, TransportResult};

/// 📬 Publishes payloads to a single queue.
#[derive(Debug)]
pub struct SqsTransport {
    client: aws_sdk_sqs::Client,
    queue_url: String,
}

impl SqsTransport {
    /// 🏗️ Stand up a client against the descriptor's region and pin it to the
    /// descriptor's queue.
    pub async fn new(descriptor: &SqsDescriptor) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(descriptor.region().to_string()))
            .load()
            .await;
        Self::with_client(aws_sdk_sqs::Client::new(&config), descriptor.queue_url())
    }

    /// 🏗️ Same, but with a prebuilt client — the door for localstack-shaped
    /// endpoints and for tests that point the SDK somewhere deterministic.
    pub fn with_client(client: aws_sdk_sqs::Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }

    /// 📬 Publish one payload as one message.
    ///
    /// Queues have no status codes and no response body, so a delivered
    /// message is reported as a 200 with empty body text (the message id goes
    /// to the log, not the result). The size is the payload's bytes after
    /// newline normalization, same as HTTP.
    pub async fn publish(&self, body: &str) -> Result<TransportResult, TransportError> {
        let body = normalize_body(body);
        let size = body.len();

        let started = Instant::now();
        let output = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|err| TransportError::Queue(err.to_string()))?;
        let took_s = started.elapsed().as_secs_f64();

        let message_id = output.message_id().unwrap_or_default();
        debug!("📬 message {} accepted by {} in {:.3}s", message_id, self.queue_url, took_s);

        Ok(TransportResult {
            status: 200,
            body_text: String::new(),
            took_s,
            size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // 🧪 A client aimed at the mock server instead of AWS — fixed credentials,
    // fixed region, zero chance of the default chain wandering off to IMDS.
    fn client_for(endpoint: &str) -> aws_sdk_sqs::Client {
        let config = aws_sdk_sqs::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            // 🔁 No retries — a sad response should stay sad so assertions can see it.
            .retry_config(aws_sdk_sqs::config::retry::RetryConfig::disabled())
            .region(Region::new("us-east-1"))
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

    fn accepted_message(message_id: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(
            format!(
                r#"{{"MessageId":"{message_id}","MD5OfMessageBody":"d41d8cd98f00b204e9800998ecf8427e"}}"#
            ),
            "application/x-amz-json-1.0",
        )
    }

    #[tokio::test]
    async fn the_one_where_publish_delivers_and_reports_an_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains(r#"{\"a\":1}"#))
            .respond_with(accepted_message("msg-0001"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = SqsTransport::with_client(
            client_for(&server.uri()),
            "https://sqs.us-east-1.amazonaws.com/123456789012/ingest",
        );

        let result = transport
            .publish("{\"a\":1}")
            .await
            .expect("publish completes");

        assert_eq!(result.status, 200);
        assert!(result.is_success());
        assert_eq!(result.body_text, "", "queues have no response body to report");
        assert_eq!(result.size, "{\"a\":1}\n".len(), "size counts the normalized payload");
        assert!(result.took_s >= 0.0);
    }

    #[tokio::test]
    async fn the_one_where_a_declined_message_surfaces_as_a_queue_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string(
                r#"{"__type":"com.amazonaws.sqs#AccessDenied","message":"nope"}"#,
            ))
            .mount(&server)
            .await;

        let transport = SqsTransport::with_client(
            client_for(&server.uri()),
            "https://sqs.us-east-1.amazonaws.com/123456789012/ingest",
        );

        let outcome = transport.publish("{\"a\":1}").await;
        assert!(matches!(outcome, Err(TransportError::Queue(_))));
    }
}
