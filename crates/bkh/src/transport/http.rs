//! 📡 The HTTP transport — reqwest with an auth dispatcher bolted on the front.
//!
//! One `send` regardless of which club the cluster belongs to:
//! - SigV4-signed requests for managed domains (credentials via the injected
//!   provider, signature cooked per request).
//! - HTTP basic auth for clusters with a bouncer.
//! - Bare requests, certificate checks off, for the self-signed localhost rig
//!   everyone swears is temporary.
//!
//! The auth mode comes off the descriptor at construction time and never
//! changes. A transport does not have auth moods.

use std::sync::Arc;
use std::time::{Instant, SystemTime};

use aws_sigv4::http_request::{sign, SignableBody, SignableRequest, SigningSettings};
use aws_sigv4::sign::v4;
use tracing::{debug, trace};

use crate::credentials::{CredentialsProvider, EnvCredentials};
use crate::descriptor::{AuthMethod, EsDescriptor};
use crate::errors::TransportError;
use crate::transport::{normalize_body, parse_method, TransportResult, CONNECT_TIMEOUT, REQUEST_TIMEOUT};

/// 🖋️ The service name SigV4 signatures are scoped to. Managed search domains
/// answer to "es".
const SIGNING_SERVICE: &str = "es";

/// 📡 Sends HTTP requests with the descriptor's auth applied. Never retries.
#[derive(Debug)]
pub struct HttpTransport {
    // 📡 One reqwest::Client, reused for every request — spinning up a client
    // per call is the networking equivalent of buying a new car per grocery run.
    client: reqwest::Client,
    auth: AuthMethod,
    credentials: Arc<dyn CredentialsProvider>,
}

impl HttpTransport {
    /// 🏗️ Stand up a transport for the given endpoint, with credentials sourced
    /// from the process environment when signing is in play.
    pub fn new(descriptor: &EsDescriptor) -> Result<Self, TransportError> {
        Self::with_credentials(descriptor, Arc::new(EnvCredentials))
    }

    /// 🏗️ Same, but with an injected credential provider — the deterministic
    /// door for tests and for callers with their own credential plumbing.
    pub fn with_credentials(
        descriptor: &EsDescriptor,
        credentials: Arc<dyn CredentialsProvider>,
    ) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT);

        // ⚠️ No auth implies a local cluster with a self-signed cert, so
        // certificate verification comes off. This is a documented relaxation
        // for the unauthenticated mode only — signed and basic-auth transports
        // verify certs like adults.
        if matches!(descriptor.auth(), AuthMethod::NoAuth) {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build()?;
        Ok(Self {
            client,
            auth: descriptor.auth().clone(),
            credentials,
        })
    }

    /// 📡 Send one request and report what happened.
    ///
    /// The body is normalized (newline-terminated, empty stays empty), the
    /// verb is validated against the short list, auth is applied per the
    /// descriptor, and the round trip is timed with a wall clock.
    ///
    /// A non-2xx response is an `Ok` — the status rides back in the
    /// [`TransportResult`] for the caller to judge. `Err` means the request
    /// never completed: bad verb, credential trouble, or the network said no.
    pub async fn send(
        &self,
        method: &str,
        url: &str,
        body: &str,
    ) -> Result<TransportResult, TransportError> {
        let method = parse_method(method)?;
        let body = normalize_body(body);
        let size = body.len();
        trace!("📡 {} {} ({} bytes)", method, url, size);

        let (status, body_text, took_s) = match &self.auth {
            AuthMethod::SigV4 { region } => self.send_signed(method, url, body, region).await?,
            _ => self.send_unsigned(method, url, body).await?,
        };

        debug!("📡 {} from {} in {:.3}s", status, url, took_s);
        Ok(TransportResult {
            status,
            body_text,
            took_s,
            size,
        })
    }

    /// 🔓 The unsigned path — optionally with a basic-auth header.
    async fn send_unsigned(
        &self,
        method: reqwest::Method,
        url: &str,
        body: String,
    ) -> Result<(u16, String, f64), TransportError> {
        let mut request = self
            .client
            .request(method, url)
            .header("Content-Type", "application/json")
            .body(body);

        if let AuthMethod::HttpBasic { username, password } = &self.auth {
            request = request.basic_auth(username, Some(password));
        }

        // 🕰️ Clock wraps the network call and nothing else — we're measuring
        // the cluster, not our own string shuffling.
        let started = Instant::now();
        let response = request.send().await?;
        let took_s = started.elapsed().as_secs_f64();

        let status = response.status().as_u16();
        let body_text = response.text().await.unwrap_or_default();
        Ok((status, body_text, took_s))
    }

    /// 🖋️ The SigV4 path: resolve credentials, compute the signature over
    /// method + url + body + region + service, attach it as headers, send.
    async fn send_signed(
        &self,
        method: reqwest::Method,
        url: &str,
        body: String,
        region: &str,
    ) -> Result<(u16, String, f64), TransportError> {
        let creds = self.credentials.credentials().await?;
        let identity = aws_credential_types::Credentials::new(
            creds.access_key.clone(),
            creds.secret_key.clone(),
            creds.session_token.clone(),
            None,
            "bkh",
        )
        .into();

        let signing_params: aws_sigv4::http_request::SigningParams = v4::SigningParams::builder()
            .identity(&identity)
            .region(region)
            .name(SIGNING_SERVICE)
            .time(SystemTime::now())
            .settings(SigningSettings::default())
            .build()
            .map_err(|err| TransportError::Signing(err.to_string()))?
            .into();

        // 🧱 Build the request as http types first — the signer wants to see
        // exactly what will go on the wire, headers and all.
        let mut request = http::Request::builder()
            .method(method.as_str())
            .uri(url)
            .header("Content-Type", "application/json")
            .body(body)
            .map_err(|err| TransportError::Signing(err.to_string()))?;

        let signable = SignableRequest::new(
            method.as_str(),
            url,
            request
                .headers()
                .iter()
                .map(|(name, value)| (name.as_str(), value.to_str().unwrap_or(""))),
            SignableBody::Bytes(request.body().as_bytes()),
        )
        .map_err(|err| TransportError::Signing(err.to_string()))?;

        let (instructions, _signature) = sign(signable, &signing_params)
            .map_err(|err| TransportError::Signing(err.to_string()))?
            .into_parts();
        instructions.apply_to_request_http1x(&mut request);

        let request = reqwest::Request::try_from(request)?;
        let started = Instant::now();
        let response = self.client.execute(request).await?;
        let took_s = started.elapsed().as_secs_f64();

        let status = response.status().as_u16();
        let body_text = response.text().await.unwrap_or_default();
        Ok((status, body_text, took_s))
    }
}
