//! Native Sigstore bundle JSON (media types v0.1 through v0.3).

use serde::Deserialize;

use crate::bundle::{
  BundleContent, CanonicalBundle, DsseEnvelope, DsseSignature, MessageDigest, MessageSignature,
  SignerMaterial, VerificationMaterial,
};
use crate::error::BundleError;
use crate::wire::{WireTlogEntry, decode_b64};

const MEDIA_TYPE_PREFIX: &str = "application/vnd.dev.sigstore.bundle";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBundle {
  #[serde(default)]
  media_type: String,
  verification_material: Option<WireVerificationMaterial>,
  dsse_envelope: Option<WireDsseEnvelope>,
  message_signature: Option<WireMessageSignature>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireVerificationMaterial {
  certificate: Option<WireRawBytes>,
  x509_certificate_chain: Option<WireCertificateChain>,
  public_key: Option<WirePublicKey>,
  #[serde(default)]
  tlog_entries: Vec<WireTlogEntry>,
  #[serde(default)]
  timestamp_verification_data: Option<WireTimestampData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRawBytes {
  #[serde(default)]
  raw_bytes: String,
}

#[derive(Debug, Deserialize)]
struct WireCertificateChain {
  #[serde(default)]
  certificates: Vec<WireRawBytes>,
}

#[derive(Debug, Deserialize)]
struct WirePublicKey {
  #[serde(default)]
  hint: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTimestampData {
  #[serde(default)]
  rfc3161_timestamps: Vec<WireSignedTimestamp>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSignedTimestamp {
  #[serde(default)]
  signed_timestamp: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDsseEnvelope {
  #[serde(default)]
  payload: String,
  #[serde(default)]
  payload_type: String,
  #[serde(default)]
  signatures: Vec<WireDsseSignature>,
}

#[derive(Debug, Deserialize)]
struct WireDsseSignature {
  #[serde(default)]
  sig: String,
  #[serde(default)]
  keyid: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMessageSignature {
  message_digest: Option<WireMessageDigest>,
  #[serde(default)]
  signature: String,
}

#[derive(Debug, Deserialize)]
struct WireMessageDigest {
  #[serde(default)]
  algorithm: String,
  #[serde(default)]
  digest: String,
}

/// Decode and validate a native bundle. Any error means "not a native bundle".
pub(crate) fn decode(raw: &[u8]) -> Result<CanonicalBundle, BundleError> {
  let wire: WireBundle = serde_json::from_slice(raw).map_err(BundleError::UnsupportedFormat)?;

  if !wire.media_type.starts_with(MEDIA_TYPE_PREFIX) {
    return Err(BundleError::Invalid(format!(
      "unrecognized media type '{}'",
      wire.media_type
    )));
  }

  let material = wire
    .verification_material
    .ok_or_else(|| BundleError::Invalid("missing verificationMaterial".into()))?;
  let verification_material = decode_material(material)?;

  let content = match (wire.dsse_envelope, wire.message_signature) {
    (Some(envelope), None) => BundleContent::Dsse(decode_envelope(envelope)?),
    (None, Some(message)) => BundleContent::MessageSignature(decode_message(message)?),
    (Some(_), Some(_)) => {
      return Err(BundleError::Invalid(
        "both dsseEnvelope and messageSignature present".into(),
      ));
    }
    (None, None) => {
      return Err(BundleError::Invalid(
        "missing dsseEnvelope or messageSignature".into(),
      ));
    }
  };

  Ok(CanonicalBundle {
    media_type: wire.media_type,
    verification_material,
    content,
  })
}

fn decode_material(material: WireVerificationMaterial) -> Result<VerificationMaterial, BundleError> {
  let signer = match (
    material.certificate,
    material.x509_certificate_chain,
    material.public_key,
  ) {
    (Some(cert), None, None) => Some(SignerMaterial::Certificate(
      decode_b64(&cert.raw_bytes).map_err(BundleError::DecodeCertificate)?,
    )),
    (None, Some(chain), None) => {
      let certs = chain
        .certificates
        .iter()
        .map(|c| decode_b64(&c.raw_bytes))
        .collect::<Result<Vec<_>, _>>()
        .map_err(BundleError::DecodeCertificate)?;
      if certs.is_empty() {
        return Err(BundleError::Invalid("empty x509CertificateChain".into()));
      }
      Some(SignerMaterial::CertificateChain(certs))
    }
    (None, None, Some(key)) => Some(SignerMaterial::PublicKey { hint: key.hint }),
    (None, None, None) => None,
    _ => {
      return Err(BundleError::Invalid(
        "more than one of certificate, x509CertificateChain, publicKey".into(),
      ));
    }
  };

  if signer.is_none() && material.tlog_entries.is_empty() {
    return Err(BundleError::Invalid(
      "verificationMaterial has neither signer material nor tlog entries".into(),
    ));
  }

  let tlog_entries = material
    .tlog_entries
    .into_iter()
    .map(WireTlogEntry::into_canonical)
    .collect::<Result<Vec<_>, _>>()?;

  let rfc3161_timestamps = material
    .timestamp_verification_data
    .map(|data| data.rfc3161_timestamps)
    .unwrap_or_default()
    .iter()
    .map(|ts| decode_b64(&ts.signed_timestamp))
    .collect::<Result<Vec<_>, _>>()
    .map_err(BundleError::DecodeTimestamp)?;

  Ok(VerificationMaterial {
    signer,
    tlog_entries,
    rfc3161_timestamps,
  })
}

fn decode_envelope(envelope: WireDsseEnvelope) -> Result<DsseEnvelope, BundleError> {
  if envelope.signatures.is_empty() {
    return Err(BundleError::Invalid("dsseEnvelope has no signatures".into()));
  }
  let signatures = envelope
    .signatures
    .into_iter()
    .map(|s| -> Result<DsseSignature, BundleError> {
      Ok(DsseSignature {
        sig: decode_b64(&s.sig).map_err(BundleError::DecodeSignature)?,
        keyid: s.keyid.filter(|k| !k.is_empty()),
      })
    })
    .collect::<Result<Vec<_>, _>>()?;

  Ok(DsseEnvelope {
    payload: decode_b64(&envelope.payload).map_err(BundleError::DecodePayload)?,
    payload_type: envelope.payload_type,
    signatures,
  })
}

fn decode_message(message: WireMessageSignature) -> Result<MessageSignature, BundleError> {
  let message_digest = message
    .message_digest
    .map(|d| {
      decode_b64(&d.digest)
        .map(|digest| MessageDigest {
          algorithm: d.algorithm,
          digest,
        })
        .map_err(BundleError::DecodeMessageDigest)
    })
    .transpose()?;

  Ok(MessageSignature {
    message_digest,
    signature: decode_b64(&message.signature).map_err(BundleError::DecodeSignature)?,
  })
}
