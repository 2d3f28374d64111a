//! Scheme to engine routing.

use anyhow::Result;
use sigcheck_core::{
  CancellationToken, Error, SignatureScheme, VerificationResult, Verifier, VerifyOptions,
};
use sigcheck_gpg::GpgVerifier;
use sigcheck_sigstore::SigstoreVerifier;

use crate::minisign::MinisignVerifier;

/// Fresh, default-configured engine for `scheme`.
pub fn verifier_for(scheme: SignatureScheme) -> Box<dyn Verifier> {
  match scheme {
    SignatureScheme::Sigstore => Box::new(SigstoreVerifier::new()),
    SignatureScheme::Gpg => Box::new(GpgVerifier::new()),
    SignatureScheme::Minisign => Box::new(MinisignVerifier::new()),
  }
}

/// Engine for a scheme name such as `"sigstore"` or `"gpg"`; `None` if unrecognized.
pub fn get_verifier(name: &str) -> Option<Box<dyn Verifier>> {
  match name.parse::<SignatureScheme>() {
    Ok(scheme) => Some(verifier_for(scheme)),
    Err(e) => {
      tracing::debug!(error = %e, "No verifier for scheme");
      None
    }
  }
}

/// Verify with a default engine for `scheme`.
pub async fn verify(
  scheme: SignatureScheme,
  artifact: &[u8],
  signature: &[u8],
  options: &VerifyOptions,
  cancel: &CancellationToken,
) -> Result<VerificationResult> {
  let engine = verifier_for(scheme);
  verify_with(engine.as_ref(), scheme, artifact, signature, options, cancel).await
}

/// Verify with a specific engine, checking that it handles `scheme`.
///
/// The outer `Err` is only [`Error::SchemeMismatch`]; everything else is in the result.
#[tracing::instrument(
  skip(engine, artifact, signature, options, cancel),
  fields(artifact_len = artifact.len(), sig_len = signature.len())
)]
pub async fn verify_with(
  engine: &dyn Verifier,
  scheme: SignatureScheme,
  artifact: &[u8],
  signature: &[u8],
  options: &VerifyOptions,
  cancel: &CancellationToken,
) -> Result<VerificationResult> {
  if !engine.can_verify(scheme) {
    return Err(Error::SchemeMismatch {
      engine: engine.scheme(),
      requested: scheme,
    }
    .into());
  }
  if cancel.is_cancelled() {
    return Ok(VerificationResult::failed(Error::Cancelled));
  }

  let result = engine.verify(artifact, signature, options, cancel).await?;
  tracing::debug!(verified = result.is_verified(), "Verification finished");
  Ok(result)
}

/// Holds one configured engine per scheme and routes calls to it.
///
/// Use this instead of [`verify`] to inject a trusted root or an HTTP client.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
  sigstore: SigstoreVerifier,
  gpg: GpgVerifier,
  minisign: MinisignVerifier,
}

impl Dispatcher {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_sigstore(mut self, engine: SigstoreVerifier) -> Self {
    self.sigstore = engine;
    self
  }

  pub fn with_gpg(mut self, engine: GpgVerifier) -> Self {
    self.gpg = engine;
    self
  }

  pub fn verifier(&self, scheme: SignatureScheme) -> &dyn Verifier {
    match scheme {
      SignatureScheme::Sigstore => &self.sigstore,
      SignatureScheme::Gpg => &self.gpg,
      SignatureScheme::Minisign => &self.minisign,
    }
  }

  pub async fn verify(
    &self,
    scheme: SignatureScheme,
    artifact: &[u8],
    signature: &[u8],
    options: &VerifyOptions,
    cancel: &CancellationToken,
  ) -> Result<VerificationResult> {
    verify_with(
      self.verifier(scheme),
      scheme,
      artifact,
      signature,
      options,
      cancel,
    )
    .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_every_scheme_has_its_own_engine() {
    for scheme in SignatureScheme::ALL {
      let engine = verifier_for(scheme);
      assert_eq!(engine.scheme(), scheme);
      for other in SignatureScheme::ALL {
        assert_eq!(engine.can_verify(other), other == scheme, "{scheme} vs {other}");
      }
    }
  }

  #[test]
  fn test_get_verifier_by_name() {
    assert_eq!(
      get_verifier("sigstore").unwrap().scheme(),
      SignatureScheme::Sigstore
    );
    assert_eq!(get_verifier("GPG").unwrap().scheme(), SignatureScheme::Gpg);
    assert_eq!(
      get_verifier("openpgp").unwrap().scheme(),
      SignatureScheme::Gpg
    );
    assert!(get_verifier("x509").is_none());
    assert!(get_verifier("").is_none());
  }

  #[tokio::test]
  async fn test_mismatched_engine_is_a_contract_error() {
    let err = verify_with(
      &MinisignVerifier::new(),
      SignatureScheme::Gpg,
      b"data",
      b"sig",
      &VerifyOptions::default(),
      &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
      err.downcast_ref::<Error>(),
      Some(Error::SchemeMismatch {
        engine: SignatureScheme::Minisign,
        requested: SignatureScheme::Gpg,
      })
    ));
  }

  #[tokio::test]
  async fn test_cancelled_token_short_circuits() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = Dispatcher::new()
      .verify(
        SignatureScheme::Gpg,
        b"data",
        b"sig",
        &VerifyOptions::default(),
        &cancel,
      )
      .await
      .unwrap();

    assert!(!result.is_verified());
    assert!(matches!(
      result.error().unwrap().downcast_ref::<Error>(),
      Some(Error::Cancelled)
    ));
  }
}
