//! Key generation and signing helpers for unit tests.

use openpgp::KeyID;
use openpgp::armor;
use openpgp::cert::prelude::*;
use openpgp::policy::StandardPolicy;
use openpgp::serialize::SerializeInto;
use openpgp::serialize::stream::{Message, Signer};
use sequoia_openpgp as openpgp;
use std::io::Write;

pub(crate) struct TestSigner {
    pub cert: Cert,
    pub signing_key_id: KeyID,
}

impl TestSigner {
    /// The public certificate as an armored key block.
    pub fn armored_public(&self) -> String {
        String::from_utf8(self.cert.armored().to_vec().unwrap()).unwrap()
    }
}

pub(crate) fn generate_signer() -> TestSigner {
    let (cert, _revocation) = CertBuilder::new()
        .add_userid("Release Signer <release@example.org>")
        .add_signing_subkey()
        .generate()
        .unwrap();

    let policy = StandardPolicy::new();
    let signing_key_id = cert
        .keys()
        .with_policy(&policy, None)
        .for_signing()
        .next()
        .unwrap()
        .key()
        .keyid();

    TestSigner {
        cert,
        signing_key_id,
    }
}

pub(crate) fn sign_detached(signer: &TestSigner, data: &[u8]) -> Vec<u8> {
    let policy = StandardPolicy::new();
    let keypair = signer
        .cert
        .keys()
        .unencrypted_secret()
        .with_policy(&policy, None)
        .for_signing()
        .next()
        .unwrap()
        .key()
        .clone()
        .into_keypair()
        .unwrap();

    let mut signature_data = Vec::new();
    let mut armor_writer = armor::Writer::new(&mut signature_data, armor::Kind::Signature).unwrap();
    let message = Message::new(&mut armor_writer);
    let mut signer = Signer::new(message, keypair).unwrap().detached().build().unwrap();
    signer.write_all(data).unwrap();
    signer.finalize().unwrap();
    armor_writer.finalize().unwrap();
    signature_data
}
