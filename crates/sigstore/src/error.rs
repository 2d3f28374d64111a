//! Error types for bundle decoding and trust material acquisition.

use base64::DecodeError;
use std::num::ParseIntError;
use thiserror::Error;

/// Failure while decoding a native bundle or translating a PEP 740 attestation.
///
/// Each decoded field has its own variant so callers can tell a bad signature from a
/// bad certificate without string matching.
#[derive(Debug, Error)]
pub enum BundleError {
  #[error("unsupported format")]
  UnsupportedFormat(#[source] serde_json::Error),

  #[error("no attestations found")]
  NoAttestations,

  #[error("invalid bundle: {0}")]
  Invalid(String),

  #[error("failed to decode signature")]
  DecodeSignature(#[source] DecodeError),

  #[error("failed to decode statement")]
  DecodeStatement(#[source] DecodeError),

  #[error("failed to decode payload")]
  DecodePayload(#[source] DecodeError),

  #[error("failed to decode message digest")]
  DecodeMessageDigest(#[source] DecodeError),

  #[error("failed to decode certificate")]
  DecodeCertificate(#[source] DecodeError),

  #[error("failed to decode RFC 3161 timestamp")]
  DecodeTimestamp(#[source] DecodeError),

  #[error("failed to parse log index")]
  ParseLogIndex(#[source] ParseIntError),

  #[error("failed to decode log ID")]
  DecodeLogId(#[source] DecodeError),

  #[error("failed to parse integrated time")]
  ParseIntegratedTime(#[source] ParseIntError),

  #[error("failed to decode signed entry timestamp")]
  DecodeSignedEntryTimestamp(#[source] DecodeError),

  #[error("failed to decode canonicalized body")]
  DecodeCanonicalizedBody(#[source] DecodeError),

  #[error("failed to parse inclusion proof log index")]
  ParseProofLogIndex(#[source] ParseIntError),

  #[error("failed to parse tree size")]
  ParseTreeSize(#[source] ParseIntError),

  #[error("failed to decode root hash")]
  DecodeRootHash(#[source] DecodeError),

  #[error("failed to decode inclusion proof hash {index}")]
  DecodeProofHash {
    index: usize,
    #[source]
    source: DecodeError,
  },
}

/// Failure while obtaining the Sigstore trusted root.
#[derive(Debug, Error)]
pub enum TrustRootError {
  #[error("failed to load trusted root: {0}")]
  Load(String),

  #[error("failed to fetch trusted root over TUF: {0}")]
  Fetch(String),

  #[error("trusted root fetch cancelled")]
  Cancelled,
}

/// The bundle is authentic but does not sign the artifact being checked.
#[derive(Debug, Error)]
pub enum SubjectError {
  #[error("unsupported DSSE payload type '{0}'")]
  UnsupportedPayloadType(String),

  #[error("failed to parse in-toto statement")]
  Statement(#[source] serde_json::Error),

  #[error("in-toto statement has no subjects")]
  NoSubjects,

  #[error("unsupported message digest algorithm '{0}'")]
  UnsupportedDigestAlgorithm(String),

  #[error("artifact digest does not match any signed subject")]
  DigestMismatch,
}
