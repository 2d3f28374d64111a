//! Public key discovery over the VKS key-by-ID endpoint (`/vks/v1/by-keyid/{KEYID}`).

use openpgp::KeyID;
use openpgp::cert::{Cert, CertParser};
use openpgp::parse::Parse;
use reqwest::StatusCode;
use sequoia_openpgp as openpgp;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Path segment of the key-by-ID lookup, appended to the keyserver base URL.
pub const KEYSERVER_LOOKUP_PATH: &str = "/vks/v1/by-keyid/";

/// Overall timeout applied to a single keyserver request.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub const USER_AGENT: &str = concat!("sigcheck/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum KeyserverError {
    #[error("invalid keyserver URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("keyserver request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("keyserver returned non-OK status: {status}")]
    Status { status: StatusCode },

    #[error("failed to parse keyring from keyserver: {0}")]
    Parse(String),

    #[error("no keys found in keyserver response")]
    NoKeys,

    #[error("keyserver request cancelled")]
    Cancelled,
}

/// Build the lookup URL for `key_id` under the keyserver at `base`.
pub fn lookup_url(base: &str, key_id: &KeyID) -> Result<Url, KeyserverError> {
    let invalid = |reason: String| KeyserverError::InvalidUrl {
        url: base.to_string(),
        reason,
    };

    let parsed = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }

    let joined = format!(
        "{}{}{}",
        base.trim_end_matches('/'),
        KEYSERVER_LOOKUP_PATH,
        key_id.to_hex()
    );
    Url::parse(&joined).map_err(|e| invalid(e.to_string()))
}

/// Thin keyserver client. Holds no per-lookup state and may be shared freely.
#[derive(Debug, Clone)]
pub struct KeyserverClient {
    client: reqwest::Client,
}

impl Default for KeyserverClient {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyserverClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to build configured HTTP client, using defaults");
                reqwest::Client::new()
            });
        Self { client }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch the certificates the keyserver publishes for `key_id`.
    #[tracing::instrument(skip(self, cancel), fields(key_id = %key_id.to_hex()))]
    pub async fn fetch_certs(
        &self,
        base: &str,
        key_id: &KeyID,
        cancel: &CancellationToken,
    ) -> Result<Vec<Cert>, KeyserverError> {
        let url = lookup_url(base, key_id)?;
        tracing::debug!(%url, "Fetching public key");

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(KeyserverError::Cancelled),
            body = self.get(url) => body?,
        };

        parse_keyring(&body)
    }

    async fn get(&self, url: Url) -> Result<Vec<u8>, KeyserverError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(KeyserverError::Status { status });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

fn parse_keyring(body: &[u8]) -> Result<Vec<Cert>, KeyserverError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(KeyserverError::NoKeys);
    }

    let certs = CertParser::from_bytes(body)
        .map_err(|e| KeyserverError::Parse(format!("{e:#}")))?
        .collect::<openpgp::Result<Vec<Cert>>>()
        .map_err(|e| KeyserverError::Parse(format!("{e:#}")))?;

    if certs.is_empty() {
        return Err(KeyserverError::NoKeys);
    }
    tracing::debug!(count = certs.len(), "Parsed keyring from keyserver");
    Ok(certs)
}
