//! The uniform contract every signature engine implements.

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::types::{SignatureScheme, VerificationResult, VerifyOptions};

/// A signature verification engine for one [`SignatureScheme`].
///
/// Invalid signatures, malformed envelopes, and unreachable trust services are all reported
/// through the returned [`VerificationResult`]. The outer `Err` is reserved for contract
/// violations by the caller.
#[async_trait]
pub trait Verifier: Send + Sync {
    /// The scheme this engine handles.
    fn scheme(&self) -> SignatureScheme;

    /// True only for the engine's own scheme.
    fn can_verify(&self, scheme: SignatureScheme) -> bool {
        scheme == self.scheme()
    }

    /// Verify `signature` over `artifact`.
    ///
    /// Network work performed by the engine aborts when `cancel` fires.
    async fn verify(
        &self,
        artifact: &[u8],
        signature: &[u8],
        options: &VerifyOptions,
        cancel: &CancellationToken,
    ) -> Result<VerificationResult>;
}
