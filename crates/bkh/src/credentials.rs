//! 🔑 Credentials — where the signing material comes from.
//!
//! The transport doesn't reach into the environment on its own. It asks a
//! [`CredentialsProvider`], and the provider decides whether that means env
//! vars, a test fixture, or something fancier the caller wired in. Injected at
//! construction, so tests get determinism and production gets the usual
//! `AWS_*` trio. 🦆
//!
//! ⚠️ Secrets pass through here. The types deliberately don't implement
//! `Display`, and nothing in this module logs a value. Keep it that way.

use async_trait::async_trait;

use crate::errors::TransportError;

/// 🔑 The holy trinity of AWS auth: access key, secret key, and the optional
/// session token that shows up when STS is involved.
#[derive(Debug, Clone)]
pub struct SigningCredentials {
    pub access_key: String,
    pub secret_key: String,
    pub session_token: Option<String>,
}

/// 🔌 Anything that can cough up signing credentials on demand.
///
/// Resolved per send, not cached here — short-lived STS tokens rotate, and a
/// transport that signs with yesterday's token gets a very confusing 403.
#[async_trait]
pub trait CredentialsProvider: Send + Sync + std::fmt::Debug {
    async fn credentials(&self) -> Result<SigningCredentials, TransportError>;
}

/// 🌍 The production default: read `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`,
/// and (optionally) `AWS_SESSION_TOKEN` from the process environment.
#[derive(Debug, Default)]
pub struct EnvCredentials;

#[async_trait]
impl CredentialsProvider for EnvCredentials {
    async fn credentials(&self) -> Result<SigningCredentials, TransportError> {
        let access_key = std::env::var("AWS_ACCESS_KEY_ID")
            .map_err(|_| TransportError::Credentials("AWS_ACCESS_KEY_ID is not set".into()))?;
        let secret_key = std::env::var("AWS_SECRET_ACCESS_KEY")
            .map_err(|_| TransportError::Credentials("AWS_SECRET_ACCESS_KEY is not set".into()))?;
        // 🔑 Session token is optional — long-lived IAM user keys don't have one.
        let session_token = std::env::var("AWS_SESSION_TOKEN").ok();
        Ok(SigningCredentials {
            access_key,
            secret_key,
            session_token,
        })
    }
}

/// 🧪 Fixed credentials for tests and other deterministic setups. No
/// environment, no surprises, no flaky CI run at 3am.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    creds: SigningCredentials,
}

impl StaticCredentials {
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            creds: SigningCredentials {
                access_key: access_key.into(),
                secret_key: secret_key.into(),
                session_token,
            },
        }
    }
}

#[async_trait]
impl CredentialsProvider for StaticCredentials {
    async fn credentials(&self) -> Result<SigningCredentials, TransportError> {
        Ok(self.creds.clone())
    }
}
