//! Common types and result structures.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Default public keyserver used for OpenPGP key discovery.
pub const DEFAULT_KEYSERVER_URL: &str = "https://keys.openpgp.org";

/// Environment variable overriding the keyserver in [`VerifyOptions::from_env`].
pub const KEYSERVER_URL_ENV: &str = "SIGCHECK_KEYSERVER_URL";

/// Trust scheme a signature was produced under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureScheme {
    /// Keyless Sigstore bundles (including PEP 740 attestations).
    Sigstore,
    /// Detached ASCII-armored OpenPGP signatures.
    Gpg,
    /// Minisign signatures (no key discovery yet).
    Minisign,
}

impl SignatureScheme {
    pub const ALL: [SignatureScheme; 3] = [
        SignatureScheme::Sigstore,
        SignatureScheme::Gpg,
        SignatureScheme::Minisign,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureScheme::Sigstore => "sigstore",
            SignatureScheme::Gpg => "gpg",
            SignatureScheme::Minisign => "minisign",
        }
    }
}

impl fmt::Display for SignatureScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sigstore" => Ok(SignatureScheme::Sigstore),
            "gpg" | "pgp" | "openpgp" => Ok(SignatureScheme::Gpg),
            "minisign" => Ok(SignatureScheme::Minisign),
            _ => Err(Error::UnknownScheme(s.to_string())),
        }
    }
}

/// Options for a single verification call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOptions {
    /// Keyserver base URL. Empty or unset means [`DEFAULT_KEYSERVER_URL`].
    pub keyserver_url: Option<String>,
}

impl VerifyOptions {
    pub fn with_keyserver_url(url: impl Into<String>) -> Self {
        Self {
            keyserver_url: Some(url.into()),
        }
    }

    /// Build options from the process environment.
    pub fn from_env() -> Self {
        Self {
            keyserver_url: std::env::var(KEYSERVER_URL_ENV).ok(),
        }
    }

    /// The keyserver base URL to use, falling back to the default.
    pub fn keyserver_url(&self) -> &str {
        match self.keyserver_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url,
            _ => DEFAULT_KEYSERVER_URL,
        }
    }
}

/// Outcome of a verification call.
///
/// `verified()` is true exactly when `error()` is `None`; the constructors are the only way
/// to build a result, so the two can never disagree.
#[derive(Debug)]
pub struct VerificationResult {
    key_id: String,
    error: Option<anyhow::Error>,
}

impl VerificationResult {
    /// A successful verification. `key_id` is empty for keyless schemes.
    pub fn verified(key_id: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            error: None,
        }
    }

    /// A failed verification with no key attribution.
    pub fn failed(error: impl Into<anyhow::Error>) -> Self {
        Self {
            key_id: String::new(),
            error: Some(error.into()),
        }
    }

    /// A failed verification that records which key was attempted.
    pub fn failed_with_key(key_id: impl Into<String>, error: impl Into<anyhow::Error>) -> Self {
        Self {
            key_id: key_id.into(),
            error: Some(error.into()),
        }
    }

    pub fn is_verified(&self) -> bool {
        self.error.is_none()
    }

    /// Hex key ID for OpenPGP results; empty otherwise.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn error(&self) -> Option<&anyhow::Error> {
        self.error.as_ref()
    }

    pub fn into_error(self) -> Option<anyhow::Error> {
        self.error
    }
}

impl Serialize for VerificationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Report<'a> {
            verified: bool,
            key_id: &'a str,
            error: Option<String>,
        }

        Report {
            verified: self.is_verified(),
            key_id: &self.key_id,
            error: self.error.as_ref().map(|e| format!("{e:#}")),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn scheme_names_round_trip_through_display() {
        for scheme in SignatureScheme::ALL {
            assert_eq!(scheme.to_string().parse::<SignatureScheme>().unwrap(), scheme);
        }
    }

    #[test]
    fn scheme_aliases_and_unknown_names() {
        assert_eq!("OpenPGP".parse::<SignatureScheme>().unwrap(), SignatureScheme::Gpg);
        assert_eq!(" PGP ".parse::<SignatureScheme>().unwrap(), SignatureScheme::Gpg);
        let err = "cosign".parse::<SignatureScheme>().unwrap_err();
        assert!(matches!(err, Error::UnknownScheme(ref s) if s == "cosign"));
    }

    #[test]
    fn keyserver_defaults_when_unset_or_blank() {
        assert_eq!(VerifyOptions::default().keyserver_url(), DEFAULT_KEYSERVER_URL);
        assert_eq!(
            VerifyOptions::with_keyserver_url("  ").keyserver_url(),
            DEFAULT_KEYSERVER_URL
        );
        assert_eq!(
            VerifyOptions::with_keyserver_url("http://127.0.0.1:11371").keyserver_url(),
            "http://127.0.0.1:11371"
        );
    }

    #[test]
    fn result_invariant_holds_for_every_constructor() {
        let ok = VerificationResult::verified("");
        assert!(ok.is_verified());
        assert!(ok.error().is_none());

        let failed = VerificationResult::failed(Error::NotImplemented(SignatureScheme::Minisign));
        assert!(!failed.is_verified());
        assert!(failed.error().is_some());

        let keyed = VerificationResult::failed_with_key("ABCDEF0123456789", Error::Cancelled);
        assert!(!keyed.is_verified());
        assert_eq!(keyed.key_id(), "ABCDEF0123456789");
    }

    #[test]
    fn result_serializes_full_error_chain() {
        let err = Err::<(), _>(Error::Cancelled)
            .context("failed to fetch key")
            .unwrap_err();
        let json = serde_json::to_value(VerificationResult::failed(err)).unwrap();
        assert_eq!(json["verified"], false);
        assert_eq!(json["key_id"], "");
        assert_eq!(json["error"], "failed to fetch key: verification cancelled");

        let json = serde_json::to_value(VerificationResult::verified("0011223344556677")).unwrap();
        assert_eq!(json["verified"], true);
        assert!(json["error"].is_null());
    }
}
