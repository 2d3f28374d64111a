//! Issuer key ID extraction from ASCII-armored detached signatures.

use openpgp::armor::{Kind, Reader, ReaderMode};
use openpgp::parse::Parse;
use openpgp::{KeyID, Packet, PacketPile};
use sequoia_openpgp as openpgp;
use std::io::Read;
use thiserror::Error;

const PGP_SIG_BEGIN: &[u8] = b"-----BEGIN PGP SIGNATURE-----";
const PGP_SIG_END: &[u8] = b"-----END PGP SIGNATURE-----";

#[derive(Debug, Error)]
pub enum KeyIdError {
    #[error("signature is empty")]
    Empty,

    #[error("no ASCII-armored PGP signature block found")]
    NotArmored,

    #[error("failed to decode armor: {0}")]
    Armor(String),

    #[error("failed to parse signature packets: {0}")]
    Packets(String),

    #[error("no key ID found in signature")]
    NoKeyId,
}

/// The armored signature block that will be checked, and the key ID it names.
#[derive(Debug, Clone)]
pub struct DetachedSignature {
    pub armored: Vec<u8>,
    pub key_id: KeyID,
}

/// Extract the issuer key ID from the first signature packet that names one.
///
/// The Issuer subpacket is preferred; v6 signatures only carry an Issuer Fingerprint, whose
/// low 64 bits are used instead.
pub fn extract_key_id(signature: &[u8]) -> Result<KeyID, KeyIdError> {
    parse_detached(signature).map(|sig| sig.key_id)
}

/// Select the first armored block of a signature file and read its issuer key ID.
///
/// Text around the block and any later blocks are ignored.
#[tracing::instrument(skip(signature), fields(sig_len = signature.len()))]
pub fn parse_detached(signature: &[u8]) -> Result<DetachedSignature, KeyIdError> {
    if signature.iter().all(u8::is_ascii_whitespace) {
        return Err(KeyIdError::Empty);
    }

    let block = extract_pgp_signatures(signature)
        .into_iter()
        .next()
        .ok_or(KeyIdError::NotArmored)?;
    let key_id = block_key_id(&block)?;
    Ok(DetachedSignature {
        armored: block,
        key_id,
    })
}

fn block_key_id(block: &[u8]) -> Result<KeyID, KeyIdError> {

    let mut decoded = Vec::new();
    Reader::from_bytes(block, ReaderMode::Tolerant(Some(Kind::Signature)))
        .read_to_end(&mut decoded)
        .map_err(|e| KeyIdError::Armor(e.to_string()))?;
    if decoded.is_empty() {
        return Err(KeyIdError::Armor("armored block contains no data".into()));
    }

    let pile = PacketPile::from_bytes(&decoded).map_err(|e| KeyIdError::Packets(format!("{e:#}")))?;

    for packet in pile.descendants() {
        let Packet::Signature(sig) = packet else {
            continue;
        };
        if let Some(id) = sig.issuers().next() {
            tracing::debug!(key_id = %id.to_hex(), "Found issuer key ID");
            return Ok(id.clone());
        }
        if let Some(fpr) = sig.issuer_fingerprints().next() {
            let id = KeyID::from(fpr);
            tracing::debug!(key_id = %id.to_hex(), "Derived key ID from issuer fingerprint");
            return Ok(id);
        }
    }

    Err(KeyIdError::NoKeyId)
}

/// Every `PGP SIGNATURE` armor block in a signature file, in order, each with at most one
/// trailing line ending.
#[tracing::instrument(skip(data), fields(data_len = data.len()))]
pub fn extract_pgp_signatures(data: &[u8]) -> Vec<Vec<u8>> {
    let mut sigs = Vec::new();
    let mut i = 0;
    while let Some(begin) = find_subslice(data, PGP_SIG_BEGIN, i) {
        let Some(end) = find_subslice(data, PGP_SIG_END, begin) else {
            break;
        };
        let mut end_pos = end + PGP_SIG_END.len();
        // Include at most one trailing newline
        if end_pos < data.len() && data[end_pos] == b'\r' {
            end_pos += 1;
            if end_pos < data.len() && data[end_pos] == b'\n' {
                end_pos += 1;
            }
        } else if end_pos < data.len() && data[end_pos] == b'\n' {
            end_pos += 1;
        }
        sigs.push(data[begin..end_pos].to_vec());
        i = end_pos;
    }
    tracing::debug!(count = sigs.len(), "Extracted PGP signature blocks");
    sigs
}

fn find_subslice(haystack: &[u8], needle: &[u8], start: usize) -> Option<usize> {
    if needle.is_empty() || start >= haystack.len() {
        return None;
    }
    haystack[start..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| start + pos)
}
