//! Artifact signature verification across Sigstore, PEP 740, OpenPGP and Minisign.
//!
//! ```no_run
//! # async fn run(artifact: &[u8], signature: &[u8]) -> anyhow::Result<()> {
//! use sigcheck::{CancellationToken, SignatureScheme, VerifyOptions};
//!
//! let result = sigcheck::verify(
//!   SignatureScheme::Gpg,
//!   artifact,
//!   signature,
//!   &VerifyOptions::from_env(),
//!   &CancellationToken::new(),
//! )
//! .await?;
//! if let Some(err) = result.error() {
//!   eprintln!("rejected: {err:#}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod dispatch;
pub mod minisign;
pub mod report;

pub use dispatch::{Dispatcher, get_verifier, verifier_for, verify, verify_with};
pub use minisign::MinisignVerifier;
pub use report::VerificationReport;

pub use sigcheck_core::{
  CancellationToken, DEFAULT_KEYSERVER_URL, Error, KEYSERVER_URL_ENV, SignatureScheme,
  VerificationResult, Verifier, VerifyOptions,
};
pub use sigcheck_gpg::{GpgVerifier, extract_key_id};
pub use sigcheck_sigstore::{
  BundleError, CanonicalBundle, SigstoreVerifier, TrustRootSource, parse_bundle,
};
