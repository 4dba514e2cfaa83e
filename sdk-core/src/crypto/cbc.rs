//! AES-128-CBC for EBICS order data.
//!
//! EBICS transaction-key encryption runs AES-128 in CBC mode with an
//! all-zero initialisation vector; padding is PKCS#7.

use crate::error::{EbicsError, Result};
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use zeroize::Zeroizing;

type Aes128CbcEnc = ::cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = ::cbc::Decryptor<aes::Aes128>;

const ZERO_IV: [u8; 16] = [0u8; 16];

/// Encrypt with AES-128-CBC, zero IV, PKCS#7 padding
pub fn encrypt(key: &[u8; 16], plaintext: &[u8]) -> Vec<u8> {
    Aes128CbcEnc::new(key.into(), &ZERO_IV.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

/// Decrypt with AES-128-CBC, zero IV, PKCS#7 padding
pub fn decrypt(key: &[u8; 16], ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    Aes128CbcDec::new(key.into(), &ZERO_IV.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| EbicsError::Crypto("AES-CBC decryption failed".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cbc_roundtrip() {
        let key = [0x42u8; 16];
        let plaintext = b"pain.001 payload bytes";

        let ct = encrypt(&key, plaintext);
        assert_eq!(ct.len() % 16, 0);
        assert_ne!(&ct[..plaintext.len().min(ct.len())], &plaintext[..]);

        let pt = decrypt(&key, &ct).unwrap();
        assert_eq!(pt.as_slice(), plaintext);
    }

    #[test]
    fn test_wrong_key_fails_or_differs() {
        let ct = encrypt(&[0x42u8; 16], b"some payload of decent length!!!");
        match decrypt(&[0x43u8; 16], &ct) {
            Ok(pt) => assert_ne!(pt.as_slice(), b"some payload of decent length!!!"),
            Err(_) => {}
        }
    }

    #[test]
    fn test_empty_input_pads_to_one_block() {
        let key = [7u8; 16];
        let ct = encrypt(&key, b"");
        assert_eq!(ct.len(), 16);
        assert_eq!(decrypt(&key, &ct).unwrap().len(), 0);
    }
}
