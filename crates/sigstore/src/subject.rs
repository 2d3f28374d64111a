//! Binding the artifact digest to what the bundle actually signed.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::bundle::{BundleContent, CanonicalBundle, IN_TOTO_PAYLOAD_TYPE};
use crate::error::SubjectError;

const SHA2_256: &str = "SHA2_256";

#[derive(Debug, Deserialize)]
struct Statement {
  #[serde(default)]
  subject: Vec<Subject>,
}

#[derive(Debug, Deserialize)]
struct Subject {
  #[serde(default)]
  digest: BTreeMap<String, String>,
}

/// Require the bundle's signed content to name `sha256` as its subject.
///
/// DSSE envelopes must carry an in-toto statement with at least one subject whose
/// `sha256` digest equals the artifact's. A message signature's digest, when present,
/// must be SHA2_256 and equal the artifact's.
pub(crate) fn check_subject(
  bundle: &CanonicalBundle,
  sha256: &[u8; 32],
) -> Result<(), SubjectError> {
  match &bundle.content {
    BundleContent::Dsse(envelope) => {
      if envelope.payload_type != IN_TOTO_PAYLOAD_TYPE {
        return Err(SubjectError::UnsupportedPayloadType(
          envelope.payload_type.clone(),
        ));
      }
      let statement: Statement =
        serde_json::from_slice(&envelope.payload).map_err(SubjectError::Statement)?;
      if statement.subject.is_empty() {
        return Err(SubjectError::NoSubjects);
      }

      let expected = hex::encode(sha256);
      let matched = statement.subject.iter().any(|subject| {
        subject
          .digest
          .get("sha256")
          .is_some_and(|digest| digest.eq_ignore_ascii_case(&expected))
      });
      if matched {
        Ok(())
      } else {
        Err(SubjectError::DigestMismatch)
      }
    }
    BundleContent::MessageSignature(message) => match &message.message_digest {
      Some(digest) if digest.algorithm != SHA2_256 => Err(
        SubjectError::UnsupportedDigestAlgorithm(digest.algorithm.clone()),
      ),
      Some(digest) if digest.digest.as_slice() != sha256.as_slice() => {
        Err(SubjectError::DigestMismatch)
      }
      // Without a digest the log entry body carries the hash the library checks.
      _ => Ok(()),
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::bundle::{
    DsseEnvelope, DsseSignature, MessageDigest, MessageSignature, VerificationMaterial,
  };
  use sigcheck_core::sha256_digest;

  fn dsse(payload_type: &str, payload: &str) -> CanonicalBundle {
    CanonicalBundle {
      media_type: crate::BUNDLE_V03_MEDIA_TYPE.into(),
      verification_material: VerificationMaterial::default(),
      content: BundleContent::Dsse(DsseEnvelope {
        payload: payload.as_bytes().to_vec(),
        payload_type: payload_type.into(),
        signatures: vec![DsseSignature {
          sig: vec![0x30],
          keyid: None,
        }],
      }),
    }
  }

  fn statement_for(sha256_hex: &str) -> String {
    format!(
      r#"{{"_type":"https://in-toto.io/Statement/v1","subject":[{{"name":"pkg.tar.gz","digest":{{"sha256":"{sha256_hex}"}}}}],"predicateType":"https://slsa.dev/provenance/v1","predicate":{{}}}}"#
    )
  }

  #[test]
  fn test_matching_subject() {
    let digest = sha256_digest(b"artifact");
    let bundle = dsse(IN_TOTO_PAYLOAD_TYPE, &statement_for(&hex::encode(digest)));
    assert!(check_subject(&bundle, &digest).is_ok());

    let upper = dsse(
      IN_TOTO_PAYLOAD_TYPE,
      &statement_for(&hex::encode_upper(digest)),
    );
    assert!(check_subject(&upper, &digest).is_ok());
  }

  #[test]
  fn test_other_artifact_does_not_match() {
    let bundle = dsse(
      IN_TOTO_PAYLOAD_TYPE,
      &statement_for(&hex::encode(sha256_digest(b"artifact"))),
    );
    assert!(matches!(
      check_subject(&bundle, &sha256_digest(b"other")),
      Err(SubjectError::DigestMismatch)
    ));
  }

  #[test]
  fn test_non_in_toto_payload_binds_nothing() {
    let bundle = dsse("text/plain", "hello");
    assert!(matches!(
      check_subject(&bundle, &sha256_digest(b"hello")),
      Err(SubjectError::UnsupportedPayloadType(t)) if t == "text/plain"
    ));
  }

  #[test]
  fn test_empty_subject_list_binds_nothing() {
    let bundle = dsse(
      IN_TOTO_PAYLOAD_TYPE,
      r#"{"_type":"https://in-toto.io/Statement/v1","subject":[],"predicate":{}}"#,
    );
    assert!(matches!(
      check_subject(&bundle, &sha256_digest(b"anything")),
      Err(SubjectError::NoSubjects)
    ));
  }

  #[test]
  fn test_subject_without_sha256_does_not_match() {
    let bundle = dsse(
      IN_TOTO_PAYLOAD_TYPE,
      r#"{"subject":[{"name":"pkg","digest":{"sha512":"00"}}]}"#,
    );
    assert!(matches!(
      check_subject(&bundle, &sha256_digest(b"pkg")),
      Err(SubjectError::DigestMismatch)
    ));
  }

  #[test]
  fn test_message_digest_must_match() {
    let digest = sha256_digest(b"artifact");
    let bundle = |algorithm: &str, bytes: Vec<u8>| CanonicalBundle {
      media_type: crate::BUNDLE_V03_MEDIA_TYPE.into(),
      verification_material: VerificationMaterial::default(),
      content: BundleContent::MessageSignature(MessageSignature {
        message_digest: Some(MessageDigest {
          algorithm: algorithm.into(),
          digest: bytes,
        }),
        signature: vec![0x30],
      }),
    };

    assert!(check_subject(&bundle(SHA2_256, digest.to_vec()), &digest).is_ok());
    assert!(matches!(
      check_subject(&bundle(SHA2_256, vec![0; 32]), &digest),
      Err(SubjectError::DigestMismatch)
    ));
    assert!(matches!(
      check_subject(&bundle("SHA2_512", vec![0; 64]), &digest),
      Err(SubjectError::UnsupportedDigestAlgorithm(_))
    ));
  }
}
