//! PEP 740 provenance (as served by the PyPI integrity API) to canonical bundle translation.
//!
//! Only the first attestation of the first attestation bundle is translated. The
//! attestation's envelope is a DSSE envelope whose payload is an in-toto statement, so
//! the result is always a v0.3 bundle with DSSE content.

use serde::Deserialize;

use crate::bundle::{
  BUNDLE_V03_MEDIA_TYPE, BundleContent, CanonicalBundle, DsseEnvelope, DsseSignature,
  IN_TOTO_PAYLOAD_TYPE, SignerMaterial, VerificationMaterial,
};
use crate::error::BundleError;
use crate::wire::{WireTlogEntry, decode_b64};

#[derive(Debug, Deserialize)]
struct Provenance {
  #[serde(default)]
  attestation_bundles: Vec<AttestationBundle>,
}

#[derive(Debug, Deserialize)]
struct AttestationBundle {
  #[serde(default)]
  attestations: Vec<Attestation>,
}

#[derive(Debug, Deserialize)]
struct Attestation {
  #[serde(default)]
  verification_material: AttestationMaterial,
  #[serde(default)]
  envelope: Envelope,
}

#[derive(Debug, Default, Deserialize)]
struct AttestationMaterial {
  #[serde(default)]
  certificate: String,
  #[serde(default)]
  transparency_entries: Vec<WireTlogEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct Envelope {
  #[serde(default)]
  statement: String,
  #[serde(default)]
  signature: String,
}

pub(crate) fn translate(raw: &[u8]) -> Result<CanonicalBundle, BundleError> {
  let provenance: Provenance =
    serde_json::from_slice(raw).map_err(BundleError::UnsupportedFormat)?;

  let attestation = provenance
    .attestation_bundles
    .into_iter()
    .next()
    .and_then(|bundle| bundle.attestations.into_iter().next())
    .ok_or(BundleError::NoAttestations)?;

  let sig = decode_b64(&attestation.envelope.signature).map_err(BundleError::DecodeSignature)?;
  let payload =
    decode_b64(&attestation.envelope.statement).map_err(BundleError::DecodeStatement)?;
  let certificate = decode_b64(&attestation.verification_material.certificate)
    .map_err(BundleError::DecodeCertificate)?;

  let tlog_entries = attestation
    .verification_material
    .transparency_entries
    .into_iter()
    .map(WireTlogEntry::into_canonical)
    .collect::<Result<Vec<_>, _>>()?;

  Ok(CanonicalBundle {
    media_type: BUNDLE_V03_MEDIA_TYPE.to_string(),
    verification_material: VerificationMaterial {
      signer: Some(SignerMaterial::Certificate(certificate)),
      tlog_entries,
      rfc3161_timestamps: Vec::new(),
    },
    content: BundleContent::Dsse(DsseEnvelope {
      payload,
      payload_type: IN_TOTO_PAYLOAD_TYPE.to_string(),
      signatures: vec![DsseSignature { sig, keyid: None }],
    }),
  })
}
