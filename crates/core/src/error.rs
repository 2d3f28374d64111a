//! Contract-level errors shared by every engine.

use thiserror::Error;

use crate::types::SignatureScheme;

#[derive(Debug, Error)]
pub enum Error {
    /// The requested scheme name does not correspond to any engine.
    #[error("unknown signature scheme: {0}")]
    UnknownScheme(String),

    /// An engine was asked to verify a scheme it does not handle.
    #[error("{engine} verifier cannot handle {requested} signatures")]
    SchemeMismatch {
        engine: SignatureScheme,
        requested: SignatureScheme,
    },

    /// The scheme has no verification backend yet.
    #[error("{0} verification not yet implemented")]
    NotImplemented(SignatureScheme),

    /// The caller cancelled the operation.
    #[error("verification cancelled")]
    Cancelled,
}
