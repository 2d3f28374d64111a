//! OpenPGP detached signature verification using sequoia-openpgp, with issuer keys
//! discovered on an HKP/VKS keyserver.

pub mod keyid;
pub mod keyserver;
pub mod verify;

#[cfg(test)]
pub(crate) mod testutil;

pub use keyid::{
    DetachedSignature, KeyIdError, extract_key_id, extract_pgp_signatures, parse_detached,
};
pub use keyserver::{
    DEFAULT_HTTP_TIMEOUT, KEYSERVER_LOOKUP_PATH, KeyserverClient, KeyserverError, USER_AGENT,
    lookup_url,
};
pub use verify::GpgVerifier;
