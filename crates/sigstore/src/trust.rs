//! Where the Sigstore trusted root (Fulcio CAs, Rekor keys, TSA certificates) comes from.

use sigstore_trust_root::TrustedRoot;
use sigstore_trust_root::tuf::{PRODUCTION_TUF_ROOT, TufConfig};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::TrustRootError;

/// Trusted root strategy for the keyless engine.
#[derive(Clone, Default)]
pub enum TrustRootSource {
  /// A root supplied by the caller, shared across calls.
  Injected(Arc<TrustedRoot>),
  /// The public-good root embedded in `sigstore-trust-root`. Works offline.
  Embedded,
  /// Fetched from the production TUF repository on every call, without the disk cache.
  #[default]
  Tuf,
}

impl fmt::Debug for TrustRootSource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TrustRootSource::Injected(_) => f.write_str("Injected"),
      TrustRootSource::Embedded => f.write_str("Embedded"),
      TrustRootSource::Tuf => f.write_str("Tuf"),
    }
  }
}

impl TrustRootSource {
  pub fn injected(root: TrustedRoot) -> Self {
    TrustRootSource::Injected(Arc::new(root))
  }

  /// Parse a `trusted_root.json` document into an injected source.
  pub fn from_json(json: &str) -> Result<Self, TrustRootError> {
    TrustedRoot::from_json(json)
      .map(Self::injected)
      .map_err(|e| TrustRootError::Load(e.to_string()))
  }

  /// Resolve the trusted root for one verification.
  #[tracing::instrument(skip(cancel))]
  pub async fn acquire(&self, cancel: &CancellationToken) -> Result<Arc<TrustedRoot>, TrustRootError> {
    match self {
      TrustRootSource::Injected(root) => Ok(Arc::clone(root)),
      TrustRootSource::Embedded => TrustedRoot::production()
        .map(Arc::new)
        .map_err(|e| TrustRootError::Load(e.to_string())),
      TrustRootSource::Tuf => {
        tracing::debug!("Fetching trusted root from TUF repository");
        let config = TufConfig::production().without_cache();
        tokio::select! {
          biased;
          _ = cancel.cancelled() => Err(TrustRootError::Cancelled),
          root = TrustedRoot::from_tuf_with_config(config, PRODUCTION_TUF_ROOT) => root
            .map(Arc::new)
            .map_err(|e| TrustRootError::Fetch(e.to_string())),
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_invalid_trusted_root_json() {
    assert!(matches!(
      TrustRootSource::from_json("{not json"),
      Err(TrustRootError::Load(_))
    ));
  }

  #[tokio::test]
  async fn test_tuf_fetch_honours_cancellation() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = TrustRootSource::Tuf.acquire(&cancel).await.unwrap_err();
    assert!(matches!(err, TrustRootError::Cancelled));
  }

  #[tokio::test]
  async fn test_embedded_root_loads_offline() {
    let source = TrustRootSource::Embedded;
    let root = source.acquire(&CancellationToken::new()).await.unwrap();

    // The same root can be injected and is handed back without copying.
    let injected = TrustRootSource::Injected(Arc::clone(&root));
    let again = injected.acquire(&CancellationToken::new()).await.unwrap();
    assert!(Arc::ptr_eq(&root, &again));
  }
}
