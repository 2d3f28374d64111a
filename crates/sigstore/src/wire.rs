//! JSON shapes shared by the native and PEP 740 decoders.
//!
//! Rekor transparency entries look the same in both encodings, except that PEP 740
//! producers are not consistent about key casing, so every key also accepts snake_case.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use serde::Deserialize;
use std::num::ParseIntError;

use crate::bundle::{InclusionProof, KindVersion, TransparencyLogEntry};
use crate::error::BundleError;

/// Decode standard base64, tolerating missing padding.
pub(crate) fn decode_b64(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
  let input = input.trim();
  STANDARD
    .decode(input)
    .or_else(|_| STANDARD_NO_PAD.decode(input))
}

pub(crate) fn encode_b64(bytes: &[u8]) -> String {
  STANDARD.encode(bytes)
}

/// An int64 as protobuf-JSON writes it (a string), or as a bare number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireInt {
  Number(i64),
  Text(String),
}

impl Default for WireInt {
  fn default() -> Self {
    WireInt::Text(String::new())
  }
}

impl WireInt {
  pub(crate) fn parse(&self) -> Result<i64, ParseIntError> {
    match self {
      WireInt::Number(n) => Ok(*n),
      WireInt::Text(s) => s.trim().parse(),
    }
  }

  pub(crate) fn is_blank(&self) -> bool {
    matches!(self, WireInt::Text(s) if s.trim().is_empty())
  }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireTlogEntry {
  #[serde(default, alias = "log_index")]
  log_index: WireInt,
  #[serde(default, alias = "log_id")]
  log_id: WireLogId,
  #[serde(default, alias = "kind_version")]
  kind_version: Option<WireKindVersion>,
  #[serde(default, alias = "integrated_time")]
  integrated_time: Option<WireInt>,
  #[serde(default, alias = "inclusion_promise")]
  inclusion_promise: Option<WireInclusionPromise>,
  #[serde(default, alias = "inclusion_proof")]
  inclusion_proof: Option<WireInclusionProof>,
  #[serde(default, alias = "canonicalized_body")]
  canonicalized_body: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireLogId {
  #[serde(default, alias = "key_id")]
  key_id: String,
}

#[derive(Debug, Deserialize)]
struct WireKindVersion {
  #[serde(default)]
  kind: String,
  #[serde(default)]
  version: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireInclusionPromise {
  #[serde(default, alias = "signed_entry_timestamp")]
  signed_entry_timestamp: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireInclusionProof {
  #[serde(default, alias = "log_index")]
  log_index: WireInt,
  #[serde(default, alias = "root_hash")]
  root_hash: String,
  #[serde(default, alias = "tree_size")]
  tree_size: WireInt,
  #[serde(default)]
  hashes: Vec<String>,
  #[serde(default)]
  checkpoint: Option<WireCheckpoint>,
}

#[derive(Debug, Deserialize)]
struct WireCheckpoint {
  #[serde(default)]
  envelope: String,
}

impl WireTlogEntry {
  pub(crate) fn into_canonical(self) -> Result<TransparencyLogEntry, BundleError> {
    let log_index = self.log_index.parse().map_err(BundleError::ParseLogIndex)?;
    let log_id = decode_b64(&self.log_id.key_id).map_err(BundleError::DecodeLogId)?;

    let integrated_time = match &self.integrated_time {
      Some(time) => time.parse().map_err(BundleError::ParseIntegratedTime)?,
      None => 0,
    };

    let inclusion_promise = self
      .inclusion_promise
      .map(|promise| decode_b64(&promise.signed_entry_timestamp))
      .transpose()
      .map_err(BundleError::DecodeSignedEntryTimestamp)?;

    // A proof without a log index is a placeholder some producers emit.
    let inclusion_proof = match self.inclusion_proof {
      Some(proof) if !proof.log_index.is_blank() => Some(proof.into_canonical()?),
      _ => None,
    };

    let canonicalized_body =
      decode_b64(&self.canonicalized_body).map_err(BundleError::DecodeCanonicalizedBody)?;

    Ok(TransparencyLogEntry {
      log_index,
      log_id,
      kind_version: self.kind_version.map(|kv| KindVersion {
        kind: kv.kind,
        version: kv.version,
      }),
      integrated_time,
      inclusion_promise,
      inclusion_proof,
      canonicalized_body,
    })
  }
}

impl WireInclusionProof {
  fn into_canonical(self) -> Result<InclusionProof, BundleError> {
    let log_index = self.log_index.parse().map_err(BundleError::ParseProofLogIndex)?;
    let tree_size = self.tree_size.parse().map_err(BundleError::ParseTreeSize)?;
    let root_hash = decode_b64(&self.root_hash).map_err(BundleError::DecodeRootHash)?;
    let hashes = self
      .hashes
      .iter()
      .enumerate()
      .map(|(index, hash)| {
        decode_b64(hash).map_err(|source| BundleError::DecodeProofHash { index, source })
      })
      .collect::<Result<Vec<_>, _>>()?;

    Ok(InclusionProof {
      log_index,
      tree_size,
      root_hash,
      hashes,
      checkpoint: self.checkpoint.map(|c| c.envelope).unwrap_or_default(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(value: serde_json::Value) -> Result<TransparencyLogEntry, BundleError> {
    serde_json::from_value::<WireTlogEntry>(value)
      .unwrap()
      .into_canonical()
  }

  #[test]
  fn test_wire_int_accepts_strings_and_numbers() {
    let text: WireInt = serde_json::from_str("\"42\"").unwrap();
    let number: WireInt = serde_json::from_str("42").unwrap();
    assert_eq!(text.parse().unwrap(), 42);
    assert_eq!(number.parse().unwrap(), 42);
    assert!(WireInt::default().is_blank());
    assert!(!number.is_blank());
  }

  #[test]
  fn test_decode_b64_tolerates_missing_padding() {
    assert_eq!(decode_b64("aGk=").unwrap(), b"hi");
    assert_eq!(decode_b64("aGk").unwrap(), b"hi");
    assert!(decode_b64("invalid!!!base64").is_err());
  }

  #[test]
  fn test_entry_accepts_snake_case_keys() {
    let parsed = entry(serde_json::json!({
      "log_index": "7",
      "log_id": { "key_id": "AQID" },
      "kind_version": { "kind": "dsse", "version": "0.0.1" },
      "integrated_time": "1700000000",
      "inclusion_promise": { "signed_entry_timestamp": "BAU=" },
      "canonicalized_body": "e30="
    }))
    .unwrap();

    assert_eq!(parsed.log_index, 7);
    assert_eq!(parsed.log_id, vec![1, 2, 3]);
    assert_eq!(parsed.integrated_time, 1_700_000_000);
    assert_eq!(parsed.inclusion_promise.as_deref(), Some(&[4u8, 5][..]));
    assert_eq!(parsed.canonicalized_body, b"{}");
    assert!(parsed.inclusion_proof.is_none());
  }

  #[test]
  fn test_proof_with_blank_log_index_is_dropped() {
    let parsed = entry(serde_json::json!({
      "logIndex": "1",
      "logId": { "keyId": "" },
      "inclusionProof": { "logIndex": "", "rootHash": "not base64 at all!", "treeSize": "x" },
      "canonicalizedBody": ""
    }))
    .unwrap();
    assert!(parsed.inclusion_proof.is_none());
  }

  #[test]
  fn test_proof_hash_error_carries_index() {
    let err = entry(serde_json::json!({
      "logIndex": "1",
      "logId": { "keyId": "" },
      "inclusionProof": {
        "logIndex": "1",
        "rootHash": "AAAA",
        "treeSize": "2",
        "hashes": ["AAAA", "???"]
      },
      "canonicalizedBody": ""
    }))
    .unwrap_err();
    assert!(matches!(err, BundleError::DecodeProofHash { index: 1, .. }));
  }

  #[test]
  fn test_numeric_field_errors_are_distinct() {
    let err = entry(serde_json::json!({ "logIndex": "abc" })).unwrap_err();
    assert!(matches!(err, BundleError::ParseLogIndex(_)));

    let err = entry(serde_json::json!({ "logIndex": "1", "integratedTime": "soon" })).unwrap_err();
    assert!(matches!(err, BundleError::ParseIntegratedTime(_)));

    let err = entry(serde_json::json!({
      "logIndex": "1",
      "inclusionProof": { "logIndex": "x" }
    }))
    .unwrap_err();
    assert!(matches!(err, BundleError::ParseProofLogIndex(_)));

    let err = entry(serde_json::json!({
      "logIndex": "1",
      "inclusionProof": { "logIndex": "1", "treeSize": "big" }
    }))
    .unwrap_err();
    assert!(matches!(err, BundleError::ParseTreeSize(_)));
  }
}
