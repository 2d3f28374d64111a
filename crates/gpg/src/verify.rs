//! OpenPGP signature verification.

use anyhow::{Context, Result};
use async_trait::async_trait;
use openpgp::cert::prelude::*;
use openpgp::parse::Parse;
use openpgp::parse::stream::*;
use openpgp::policy::StandardPolicy;
use openpgp::{KeyHandle, KeyID};
use sequoia_openpgp as openpgp;
use sigcheck_core::{
    CancellationToken, SignatureScheme, VerificationResult, Verifier, VerifyOptions,
};

use crate::keyid::parse_detached;
use crate::keyserver::KeyserverClient;

struct Helper {
    certs: Vec<Cert>,
    signer: Option<KeyID>,
}

impl VerificationHelper for Helper {
    fn get_certs(&mut self, _ids: &[KeyHandle]) -> openpgp::Result<Vec<Cert>> {
        Ok(self.certs.clone())
    }

    fn check(&mut self, structure: MessageStructure) -> openpgp::Result<()> {
        for layer in structure.into_iter() {
            if let MessageLayer::SignatureGroup { results } = layer {
                let mut last_error = None;
                for result in results {
                    match result {
                        Ok(good) => {
                            self.signer = Some(good.ka.key().keyid());
                            return Ok(());
                        }
                        Err(e) => {
                            last_error = Some(anyhow::anyhow!("{e}"));
                        }
                    }
                }
                if let Some(e) = last_error {
                    return Err(e);
                }
            }
        }
        Err(openpgp::Error::InvalidOperation("No valid signature".into()).into())
    }
}

/// Check a detached signature over `data` against `certs`.
///
/// Returns the ID of the key that produced the signature.
fn check_detached(data: &[u8], signature: &[u8], certs: Vec<Cert>) -> Result<KeyID> {
    let policy = StandardPolicy::new();
    let helper = Helper {
        certs,
        signer: None,
    };

    let mut verifier = DetachedVerifierBuilder::from_bytes(signature)?
        .with_policy(&policy, None, helper)?;
    verifier
        .verify_bytes(data)
        .context("Signature verification failed")?;

    verifier
        .into_helper()
        .signer
        .context("Signature verified but signing key could not be resolved")
}

/// Verifies detached OpenPGP signatures, fetching the issuer's key from a keyserver.
///
/// Any key the keyserver returns for the embedded key ID is trusted; there is no
/// fingerprint pinning or web-of-trust evaluation.
#[derive(Debug, Clone, Default)]
pub struct GpgVerifier {
    keyserver: KeyserverClient,
}

impl GpgVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured HTTP client for keyserver lookups.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            keyserver: KeyserverClient::with_client(client),
        }
    }
}

#[async_trait]
impl Verifier for GpgVerifier {
    fn scheme(&self) -> SignatureScheme {
        SignatureScheme::Gpg
    }

    #[tracing::instrument(skip_all, fields(artifact_len = artifact.len(), sig_len = signature.len()))]
    async fn verify(
        &self,
        artifact: &[u8],
        signature: &[u8],
        options: &VerifyOptions,
        cancel: &CancellationToken,
    ) -> Result<VerificationResult> {
        let detached = match parse_detached(signature) {
            Ok(detached) => detached,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read key ID from signature");
                return Ok(VerificationResult::failed(
                    anyhow::Error::new(e).context("failed to extract key ID"),
                ));
            }
        };
        let lookup_id = detached.key_id.to_hex();

        let keyserver = options.keyserver_url();
        let certs = match self
            .keyserver
            .fetch_certs(keyserver, &detached.key_id, cancel)
            .await
        {
            Ok(certs) => certs,
            Err(e) => {
                tracing::warn!(error = %e, key_id = %lookup_id, "Public key lookup failed");
                return Ok(VerificationResult::failed(
                    anyhow::Error::new(e)
                        .context(format!("failed to fetch public key {lookup_id} from {keyserver}")),
                ));
            }
        };

        match check_detached(artifact, &detached.armored, certs) {
            Ok(signer) => {
                let signer = signer.to_hex();
                tracing::info!(key_id = %signer, "Signature verified");
                Ok(VerificationResult::verified(signer))
            }
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), key_id = %lookup_id, "Signature rejected");
                Ok(VerificationResult::failed_with_key(lookup_id, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{generate_signer, sign_detached};

    #[test]
    fn detached_signature_checks_against_its_cert() {
        let signer = generate_signer();
        let sig = sign_detached(&signer, b"release-1.0.tar.gz contents");

        let key_id = check_detached(b"release-1.0.tar.gz contents", &sig, vec![signer.cert.clone()]).unwrap();
        assert_eq!(key_id, signer.signing_key_id);
    }

    #[test]
    fn tampered_artifact_is_rejected() {
        let signer = generate_signer();
        let sig = sign_detached(&signer, b"original");

        assert!(check_detached(b"tampered", &sig, vec![signer.cert.clone()]).is_err());
    }

    #[test]
    fn wrong_key_is_rejected() {
        let signer = generate_signer();
        let other = generate_signer();
        let sig = sign_detached(&signer, b"data");

        assert!(check_detached(b"data", &sig, vec![other.cert.clone()]).is_err());
    }

    #[tokio::test]
    async fn malformed_signature_fails_before_any_lookup() {
        let verifier = GpgVerifier::new();
        // An unroutable keyserver proves no request is attempted.
        let options = VerifyOptions::with_keyserver_url("http://192.0.2.1:1");
        let result = verifier
            .verify(b"data", b"garbage", &options, &CancellationToken::new())
            .await
            .unwrap();

        assert!(!result.is_verified());
        assert!(result.key_id().is_empty());
        let msg = format!("{:#}", result.error().unwrap());
        assert!(msg.starts_with("failed to extract key ID: "), "{msg}");
    }

    #[test]
    fn only_gpg_is_claimed() {
        let verifier = GpgVerifier::new();
        assert!(verifier.can_verify(SignatureScheme::Gpg));
        assert!(!verifier.can_verify(SignatureScheme::Sigstore));
        assert!(!verifier.can_verify(SignatureScheme::Minisign));
    }
}
