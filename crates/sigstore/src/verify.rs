//! Keyless Sigstore verification.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use sigcheck_core::{
  CancellationToken, SignatureScheme, VerificationResult, Verifier, VerifyOptions,
  sha256_digest,
};
use sigstore_trust_root::TrustedRoot;
use sigstore_verify::VerificationPolicy;
use sigstore_verify::types::{Bundle, Sha256Hash};
use std::sync::Arc;

use crate::bundle::{CanonicalBundle, parse_bundle};
use crate::error::TrustRootError;
use crate::subject::check_subject;
use crate::trust::TrustRootSource;

/// Verifies Sigstore bundles and PEP 740 attestations against an artifact.
///
/// The artifact's SHA-256 must match the signed subject, the signing certificate must
/// chain to the trusted root's Fulcio CA, and the transparency log entry must verify.
/// No signer identity or OIDC issuer is enforced: any certificate Fulcio issued is
/// accepted.
#[derive(Debug, Clone, Default)]
pub struct SigstoreVerifier {
  trust_root: TrustRootSource,
}

impl SigstoreVerifier {
  /// Verifier that fetches the production trusted root over TUF on every call.
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_source(trust_root: TrustRootSource) -> Self {
    Self { trust_root }
  }

  pub fn with_trusted_root(root: TrustedRoot) -> Self {
    Self::with_source(TrustRootSource::Injected(Arc::new(root)))
  }

  pub fn with_trusted_root_json(json: &str) -> Result<Self, TrustRootError> {
    Ok(Self::with_source(TrustRootSource::from_json(json)?))
  }

  pub fn trust_root(&self) -> &TrustRootSource {
    &self.trust_root
  }

  /// Verify `signature` against an artifact known only by its SHA-256 digest.
  ///
  /// [`Verifier::verify`] hashes the artifact and calls this.
  #[tracing::instrument(skip_all, fields(sha256 = %hex::encode(sha256), sig_len = signature.len()))]
  pub async fn verify_digest(
    &self,
    sha256: [u8; 32],
    signature: &[u8],
    cancel: &CancellationToken,
  ) -> Result<VerificationResult> {
    let bundle = match parse_bundle(signature) {
      Ok(bundle) => bundle,
      Err(e) => {
        tracing::warn!(error = %e, "Could not decode signature as a Sigstore bundle");
        return Ok(VerificationResult::failed(
          anyhow::Error::new(e).context("failed to parse bundle"),
        ));
      }
    };

    if let Err(e) = check_subject(&bundle, &sha256) {
      tracing::warn!(error = %e, "Bundle does not sign this artifact");
      return Ok(VerificationResult::failed(
        anyhow::Error::new(e).context("artifact is not the signed subject"),
      ));
    }

    let root = match self.trust_root.acquire(cancel).await {
      Ok(root) => root,
      Err(e) => {
        tracing::warn!(error = %e, source = ?self.trust_root, "Trusted root unavailable");
        return Ok(VerificationResult::failed(
          anyhow::Error::new(e).context("failed to obtain Sigstore trusted root"),
        ));
      }
    };

    match verify_bundle(sha256, &bundle, &root) {
      Ok(()) => {
        tracing::info!(media_type = %bundle.media_type, "Sigstore verification successful");
        Ok(VerificationResult::verified(String::new()))
      }
      Err(e) => {
        tracing::warn!(error = %format!("{e:#}"), "Sigstore verification rejected");
        Ok(VerificationResult::failed(e))
      }
    }
  }
}

/// Tlog, timestamp and certificate chain checks on; identity and issuer unconstrained.
fn keyless_policy() -> VerificationPolicy {
  VerificationPolicy::default()
}

/// Run the library verifier over an already decoded bundle.
fn verify_bundle(sha256: [u8; 32], bundle: &CanonicalBundle, root: &TrustedRoot) -> Result<()> {
  let bundle = Bundle::from_json(&bundle.to_json_string())
    .map_err(|e| anyhow!("{e}"))
    .context("bundle rejected by verification library")?;

  sigstore_verify::verify(Sha256Hash::from_bytes(sha256), &bundle, &keyless_policy(), root)
    .map_err(|e| anyhow!("{e}"))
    .context("Sigstore verification failed")?;
  Ok(())
}

#[async_trait]
impl Verifier for SigstoreVerifier {
  fn scheme(&self) -> SignatureScheme {
    SignatureScheme::Sigstore
  }

  #[tracing::instrument(skip_all, fields(artifact_len = artifact.len(), sig_len = signature.len()))]
  async fn verify(
    &self,
    artifact: &[u8],
    signature: &[u8],
    _options: &VerifyOptions,
    cancel: &CancellationToken,
  ) -> Result<VerificationResult> {
    self
      .verify_digest(sha256_digest(artifact), signature, cancel)
      .await
  }
}
