//! Minisign placeholder engine.

use anyhow::Result;
use async_trait::async_trait;
use sigcheck_core::{
  CancellationToken, Error, SignatureScheme, VerificationResult, Verifier, VerifyOptions,
};

/// Claims the Minisign scheme and rejects every signature.
///
/// Minisign has no key discovery protocol, so there is nothing to verify against yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinisignVerifier;

impl MinisignVerifier {
  pub fn new() -> Self {
    Self
  }
}

#[async_trait]
impl Verifier for MinisignVerifier {
  fn scheme(&self) -> SignatureScheme {
    SignatureScheme::Minisign
  }

  #[tracing::instrument(skip_all, fields(artifact_len = artifact.len(), sig_len = signature.len()))]
  async fn verify(
    &self,
    artifact: &[u8],
    signature: &[u8],
    _options: &VerifyOptions,
    _cancel: &CancellationToken,
  ) -> Result<VerificationResult> {
    tracing::warn!("Minisign verification requested but not supported");
    Ok(VerificationResult::failed(Error::NotImplemented(
      SignatureScheme::Minisign,
    )))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_fails_closed() {
    let verifier = MinisignVerifier::new();
    let result = verifier
      .verify(
        b"",
        b"",
        &VerifyOptions::default(),
        &CancellationToken::new(),
      )
      .await
      .unwrap();

    assert!(!result.is_verified());
    assert!(result.key_id().is_empty());
    assert_eq!(
      result.error().unwrap().to_string(),
      "minisign verification not yet implemented"
    );
  }
}
