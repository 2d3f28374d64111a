//! Artifact hashing used to bind artifacts to signed subjects.

use sha2::{Digest as _, Sha256};

/// SHA-256 of the artifact bytes.
#[tracing::instrument(skip(data), fields(data_len = data.len()))]
pub fn sha256_digest(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}
