//! RSA operations: PKCS#1 v1.5 signatures over SHA-256 digests, transaction
//! key transport, and the EBICS public key digest.

use crate::error::{EbicsError, Result};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

/// Sign a SHA-256 digest with PKCS#1 v1.5 (the A005 / X002 scheme).
pub fn sign(key: &RsaPrivateKey, digest: &[u8]) -> Result<Vec<u8>> {
    let scheme = Pkcs1v15Sign::new::<Sha256>();
    key.sign(scheme, digest)
        .map_err(|e| EbicsError::Crypto(format!("RSA signing failed: {e}")))
}

/// Verify a PKCS#1 v1.5 signature over a SHA-256 digest.
/// Any malformed input verifies as `false`.
pub fn verify(key: &RsaPublicKey, digest: &[u8], signature: &[u8]) -> bool {
    let scheme = Pkcs1v15Sign::new::<Sha256>();
    key.verify(scheme, digest, signature).is_ok()
}

/// Wrap a transaction key for the bank with PKCS#1 v1.5 encryption.
pub fn encrypt(key: &RsaPublicKey, data: &[u8]) -> Result<Vec<u8>> {
    key.encrypt(&mut rand::thread_rng(), Pkcs1v15Encrypt, data)
        .map_err(|e| EbicsError::Crypto(format!("RSA encryption failed: {e}")))
}

/// Unwrap a bank-supplied transaction key with the client private key.
pub fn decrypt(key: &RsaPrivateKey, data: &[u8]) -> Result<Vec<u8>> {
    key.decrypt(Pkcs1v15Encrypt, data)
        .map_err(|e| EbicsError::Crypto(format!("RSA decryption failed: {e}")))
}

/// EBICS public key digest.
///
/// Exponent and modulus are rendered as lower-case hexadecimal of the
/// big-endian unsigned integer, leading zeros trimmed, joined by a single
/// blank, and the SHA-256 of the resulting US-ASCII string is the digest.
pub fn pubkey_digest(key: &RsaPublicKey) -> [u8; 32] {
    let exponent_full = hex::encode(key.e().to_bytes_be());
    let modulus_full = hex::encode(key.n().to_bytes_be());
    let exponent_hex = trim_leading_zeros(&exponent_full);
    let modulus_hex = trim_leading_zeros(&modulus_full);
    let combined = format!("{} {}", exponent_hex, modulus_hex);

    let mut hasher = Sha256::new();
    hasher.update(combined.as_bytes());
    hasher.finalize().into()
}

fn trim_leading_zeros(hex: &str) -> &str {
    let trimmed = hex.trim_start_matches('0');
    if trimmed.is_empty() {
        "0"
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::BigUint;

    fn test_key() -> RsaPrivateKey {
        RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap()
    }

    #[test]
    fn test_sign_verify_roundtrip() {
        let key = test_key();
        let digest: [u8; 32] = Sha256::digest(b"order data").into();

        let sig = sign(&key, &digest).unwrap();
        assert!(verify(&key.to_public_key(), &digest, &sig));

        let other: [u8; 32] = Sha256::digest(b"tampered").into();
        assert!(!verify(&key.to_public_key(), &other, &sig));
    }

    #[test]
    fn test_verify_garbage_is_false() {
        let key = test_key().to_public_key();
        assert!(!verify(&key, &[0u8; 32], b"not a signature"));
    }

    #[test]
    fn test_key_transport_roundtrip() {
        let key = test_key();
        let tx_key = [0x5au8; 16];

        let wrapped = encrypt(&key.to_public_key(), &tx_key).unwrap();
        let unwrapped = decrypt(&key, &wrapped).unwrap();
        assert_eq!(unwrapped, tx_key);
    }

    #[test]
    fn test_pubkey_digest_rule() {
        // Exponent 0x010001 renders as "10001", the modulus keeps its
        // leading nibble, and the digest is SHA-256 of "<exp> <mod>".
        let modulus = BigUint::parse_bytes(b"b4c1d201", 16).unwrap();
        let exponent = BigUint::from(0x010001u32);
        let key = RsaPublicKey::new_unchecked(modulus, exponent);

        let expected: [u8; 32] = Sha256::digest(b"10001 b4c1d201").into();
        assert_eq!(pubkey_digest(&key), expected);
    }
}
