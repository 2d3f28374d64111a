//! Sigstore keyless verification backend.
//!
//! Accepts native Sigstore bundles and PEP 740 attestation documents; both are decoded
//! into a [`CanonicalBundle`] before verification.

pub mod bundle;
pub mod error;
mod native;
mod pep740;
mod subject;
pub mod trust;
pub mod verify;
mod wire;

pub use bundle::{
  BUNDLE_V03_MEDIA_TYPE, BundleContent, CanonicalBundle, DsseEnvelope, DsseSignature,
  IN_TOTO_PAYLOAD_TYPE, InclusionProof, KindVersion, MessageDigest, MessageSignature,
  SignerMaterial, TransparencyLogEntry, VerificationMaterial, parse_bundle,
};
pub use error::{BundleError, SubjectError, TrustRootError};
pub use trust::TrustRootSource;
pub use verify::SigstoreVerifier;
