//! Canonical in-memory Sigstore bundle and the format-detecting decoder.

use serde_json::{Value, json};

use crate::error::BundleError;
use crate::wire::encode_b64;
use crate::{native, pep740};

/// Media type written for every bundle translated from a PEP 740 attestation.
pub const BUNDLE_V03_MEDIA_TYPE: &str = "application/vnd.dev.sigstore.bundle.v0.3+json";

/// DSSE payload type of an in-toto statement.
pub const IN_TOTO_PAYLOAD_TYPE: &str = "application/vnd.in-toto+json";

/// A Sigstore bundle with every base64 field decoded and every integer parsed.
///
/// Built fresh for each verification from either encoding; see [`parse_bundle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalBundle {
  pub media_type: String,
  pub verification_material: VerificationMaterial,
  pub content: BundleContent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationMaterial {
  pub signer: Option<SignerMaterial>,
  pub tlog_entries: Vec<TransparencyLogEntry>,
  /// DER-encoded RFC 3161 timestamp tokens.
  pub rfc3161_timestamps: Vec<Vec<u8>>,
}

/// What identifies the signer. Certificates are DER.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignerMaterial {
  Certificate(Vec<u8>),
  CertificateChain(Vec<Vec<u8>>),
  PublicKey { hint: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransparencyLogEntry {
  pub log_index: i64,
  pub log_id: Vec<u8>,
  pub kind_version: Option<KindVersion>,
  /// Seconds since the Unix epoch; zero when the log did not report one.
  pub integrated_time: i64,
  /// Signed entry timestamp.
  pub inclusion_promise: Option<Vec<u8>>,
  pub inclusion_proof: Option<InclusionProof>,
  pub canonicalized_body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindVersion {
  pub kind: String,
  pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionProof {
  pub log_index: i64,
  pub tree_size: i64,
  pub root_hash: Vec<u8>,
  pub hashes: Vec<Vec<u8>>,
  pub checkpoint: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleContent {
  Dsse(DsseEnvelope),
  MessageSignature(MessageSignature),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DsseEnvelope {
  pub payload: Vec<u8>,
  pub payload_type: String,
  pub signatures: Vec<DsseSignature>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DsseSignature {
  pub sig: Vec<u8>,
  pub keyid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSignature {
  pub message_digest: Option<MessageDigest>,
  pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDigest {
  pub algorithm: String,
  pub digest: Vec<u8>,
}

impl CanonicalBundle {
  /// DER bytes of the leaf signing certificate, if the bundle carries one.
  pub fn signing_certificate(&self) -> Option<&[u8]> {
    match self.verification_material.signer.as_ref()? {
      SignerMaterial::Certificate(der) => Some(der),
      SignerMaterial::CertificateChain(chain) => chain.first().map(Vec::as_slice),
      SignerMaterial::PublicKey { .. } => None,
    }
  }

  /// Re-encode as Sigstore protobuf-JSON: standard base64, int64 values as strings.
  pub fn to_json(&self) -> Value {
    let mut material = json!({
      "tlogEntries": self
        .verification_material
        .tlog_entries
        .iter()
        .map(entry_json)
        .collect::<Vec<_>>(),
    });

    match &self.verification_material.signer {
      Some(SignerMaterial::Certificate(der)) => {
        material["certificate"] = json!({ "rawBytes": encode_b64(der) });
      }
      Some(SignerMaterial::CertificateChain(chain)) => {
        let certificates: Vec<Value> = chain
          .iter()
          .map(|der| json!({ "rawBytes": encode_b64(der) }))
          .collect();
        material["x509CertificateChain"] = json!({ "certificates": certificates });
      }
      Some(SignerMaterial::PublicKey { hint }) => {
        material["publicKey"] = json!({ "hint": hint });
      }
      None => {}
    }

    if !self.verification_material.rfc3161_timestamps.is_empty() {
      let timestamps: Vec<Value> = self
        .verification_material
        .rfc3161_timestamps
        .iter()
        .map(|token| json!({ "signedTimestamp": encode_b64(token) }))
        .collect();
      material["timestampVerificationData"] = json!({ "rfc3161Timestamps": timestamps });
    }

    let mut bundle = json!({
      "mediaType": self.media_type,
      "verificationMaterial": material,
    });

    match &self.content {
      BundleContent::Dsse(envelope) => {
        let signatures: Vec<Value> = envelope
          .signatures
          .iter()
          .map(|s| {
            json!({
              "sig": encode_b64(&s.sig),
              "keyid": s.keyid.clone().unwrap_or_default(),
            })
          })
          .collect();
        bundle["dsseEnvelope"] = json!({
          "payload": encode_b64(&envelope.payload),
          "payloadType": envelope.payload_type,
          "signatures": signatures,
        });
      }
      BundleContent::MessageSignature(message) => {
        let mut content = json!({ "signature": encode_b64(&message.signature) });
        if let Some(digest) = &message.message_digest {
          content["messageDigest"] = json!({
            "algorithm": digest.algorithm,
            "digest": encode_b64(&digest.digest),
          });
        }
        bundle["messageSignature"] = content;
      }
    }

    bundle
  }

  pub fn to_json_string(&self) -> String {
    self.to_json().to_string()
  }
}

fn entry_json(entry: &TransparencyLogEntry) -> Value {
  let mut out = json!({
    "logIndex": entry.log_index.to_string(),
    "logId": { "keyId": encode_b64(&entry.log_id) },
    "canonicalizedBody": encode_b64(&entry.canonicalized_body),
  });
  if let Some(kv) = &entry.kind_version {
    out["kindVersion"] = json!({ "kind": kv.kind, "version": kv.version });
  }
  if entry.integrated_time != 0 {
    out["integratedTime"] = json!(entry.integrated_time.to_string());
  }
  if let Some(set) = &entry.inclusion_promise {
    out["inclusionPromise"] = json!({ "signedEntryTimestamp": encode_b64(set) });
  }
  if let Some(proof) = &entry.inclusion_proof {
    let mut p = json!({
      "logIndex": proof.log_index.to_string(),
      "rootHash": encode_b64(&proof.root_hash),
      "treeSize": proof.tree_size.to_string(),
      "hashes": proof.hashes.iter().map(|h| encode_b64(h)).collect::<Vec<_>>(),
    });
    if !proof.checkpoint.is_empty() {
      p["checkpoint"] = json!({ "envelope": proof.checkpoint });
    }
    out["inclusionProof"] = p;
  }
  out
}

/// Decode a signature file as a native Sigstore bundle, falling back to a PEP 740
/// attestation.
///
/// The first decoder that succeeds wins. A document that fails native validation is
/// always handed to the PEP 740 decoder, whose error is the one reported.
#[tracing::instrument(skip(raw), fields(raw_len = raw.len()))]
pub fn parse_bundle(raw: &[u8]) -> Result<CanonicalBundle, BundleError> {
  match native::decode(raw) {
    Ok(bundle) => {
      tracing::debug!(media_type = %bundle.media_type, "Decoded native Sigstore bundle");
      return Ok(bundle);
    }
    Err(e) => tracing::debug!(error = %e, "Not a native bundle, trying PEP 740"),
  }

  let bundle = pep740::translate(raw)?;
  tracing::debug!(
    tlog_entries = bundle.verification_material.tlog_entries.len(),
    "Translated PEP 740 attestation"
  );
  Ok(bundle)
}
