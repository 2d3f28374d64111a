//! Core verification primitives: signature schemes, options, results, and the verifier contract.
//!
//! This crate has no network or cryptographic backend dependencies; the engines live in
//! `sigcheck-gpg` and `sigcheck-sigstore`, and routing lives in `sigcheck`.

pub mod digest;
pub mod error;
pub mod types;
pub mod verifier;

pub use digest::sha256_digest;
pub use error::Error;
pub use types::*;
pub use verifier::Verifier;

/// Re-exported so engines and callers share one cancellation type.
pub use tokio_util::sync::CancellationToken;
