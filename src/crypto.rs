//! Hash and signature primitives

use crate::types::Hash;
use bitcoin_hashes::{sha256d, Hash as BitcoinHash};
use ripemd::Ripemd160;
use secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1, Verification};
use sha2::{Digest, Sha256};

/// SHA256(x)
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// SHA256(SHA256(x))
pub fn double_sha256(data: &[u8]) -> Hash {
    sha256d::Hash::hash(data).into_inner()
}

/// RIPEMD160(SHA256(x))
pub fn hash160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(sha256(data)).into()
}

/// Verify a DER-encoded ECDSA signature (without sighash byte) over a 32-byte digest.
///
/// Accepts compressed and uncompressed public keys. High-S signatures are
/// normalized before verification, as Bitcoin consensus does not require low-S.
pub fn verify_ecdsa<C: Verification>(
    secp: &Secp256k1<C>,
    digest: &Hash,
    der_signature: &[u8],
    pubkey_bytes: &[u8],
) -> bool {
    let pubkey = match PublicKey::from_slice(pubkey_bytes) {
        Ok(pk) => pk,
        Err(_) => return false,
    };

    let mut signature = match Signature::from_der(der_signature) {
        Ok(sig) => sig,
        Err(_) => return false,
    };
    signature.normalize_s();

    let message = match Message::from_digest_slice(digest) {
        Ok(msg) => msg,
        Err(_) => return false,
    };

    secp.verify_ecdsa(&message, &signature, &pubkey).is_ok()
}
