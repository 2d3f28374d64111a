//! JSON-friendly summary of a verification outcome.

use serde::Serialize;
use sigcheck_core::{SignatureScheme, VerificationResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
  pub scheme: SignatureScheme,
  pub status: &'static str,
  pub key_id: String,
  /// Outermost error message.
  pub error: Option<String>,
  /// Underlying causes, outermost first, excluding `error` itself.
  pub causes: Vec<String>,
}

impl VerificationReport {
  pub fn new(scheme: SignatureScheme, result: &VerificationResult) -> Self {
    let (error, causes) = match result.error() {
      Some(e) => (
        Some(e.to_string()),
        e.chain().skip(1).map(|c| c.to_string()).collect(),
      ),
      None => (None, Vec::new()),
    };

    Self {
      scheme,
      status: if result.is_verified() { "valid" } else { "invalid" },
      key_id: result.key_id().to_string(),
      error,
      causes,
    }
  }
}
