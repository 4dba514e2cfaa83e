//! Compose and decompose order-data payloads.
//!
//! Outbound: zlib deflate, AES-128-CBC under a fresh 16-byte transaction
//! key (zero IV, PKCS#7), segmentation at 1 MiB of ciphertext, Base64 per
//! segment; the transaction key is RSA-wrapped with the bank encryption
//! key. Inbound runs the inverse with the client encryption private key.

use super::SealedOrderData;
use crate::config::{BankPublicKey, EbicsConfig};
use crate::crypto::{self, cbc, flate, rsa as rsa_ops};
use crate::error::{EbicsError, Result};
use crate::transaction::SEGMENT_BYTES;
use crate::xml::{ns, XmlElement};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Run the outbound pipeline over an upload payload.
pub fn seal(payload: &[u8], bank_crypt: &BankPublicKey) -> Result<SealedOrderData> {
    let transaction_key = crypto::random_transaction_key();
    let ciphertext = cbc::encrypt(&transaction_key, &flate::deflate(payload));

    let segments = ciphertext
        .chunks(SEGMENT_BYTES)
        .map(|chunk| BASE64.encode(chunk))
        .collect();

    let wrapped = rsa_ops::encrypt(&bank_crypt.key, &transaction_key)?;

    Ok(SealedOrderData {
        segments,
        transaction_key,
        wrapped_key: BASE64.encode(wrapped),
        key_digest: BASE64.encode(bank_crypt.digest),
    })
}

/// Run the inbound pipeline over collected download segments.
///
/// `segments` must already be in ascending segment order; `wrapped_key` is
/// the Base64 `TransactionKey` from the initialisation response.
pub fn open(
    segments: &[String],
    wrapped_key: &str,
    crypt_key: &rsa::RsaPrivateKey,
) -> Result<Zeroizing<Vec<u8>>> {
    let wrapped = decode_b64(wrapped_key)?;
    let key_bytes = Zeroizing::new(rsa_ops::decrypt(crypt_key, &wrapped)?);
    let transaction_key: [u8; 16] = key_bytes
        .as_slice()
        .try_into()
        .map_err(|_| EbicsError::Crypto("transaction key is not 16 bytes".into()))?;

    let mut ciphertext = Vec::new();
    for segment in segments {
        ciphertext.extend_from_slice(&decode_b64(segment)?);
    }

    let deflated = cbc::decrypt(&transaction_key, &ciphertext)?;
    Ok(Zeroizing::new(flate::inflate(&deflated)?))
}

/// Compress and Base64-wrap a key management document (the unsecured
/// INI/HIA order data carries no encryption).
pub fn compress_b64(document: &[u8]) -> String {
    BASE64.encode(flate::deflate(document))
}

/// Inverse of [`compress_b64`].
pub fn decompress_b64(data: &str) -> Result<Vec<u8>> {
    flate::inflate(&decode_b64(data)?)
}

/// Build and seal the A005 electronic signature accompanying an upload:
/// a `UserSignatureData` document signed over the SHA-256 of the payload,
/// deflated and encrypted under the upload's transaction key.
pub fn user_signature_data(
    payload: &[u8],
    config: &EbicsConfig,
    transaction_key: &[u8; 16],
) -> Result<String> {
    let digest: [u8; 32] = Sha256::digest(payload).into();
    let signature = rsa_ops::sign(config.sign_key.private(), &digest)?;

    let document = XmlElement::new(ns::node::USER_SIGNATURE_DATA)
        .attr(ns::attr::XMLNS, ns::S001)
        .child(
            XmlElement::new(ns::node::ORDER_SIGNATURE_DATA)
                .child(
                    XmlElement::new(ns::node::SIGNATURE_VERSION)
                        .text(config.sign_key.version().as_str()),
                )
                .child(XmlElement::new("SignatureValue").text(BASE64.encode(signature)))
                .child(XmlElement::new(ns::node::PARTNER_ID).text(&config.partner_id))
                .child(XmlElement::new(ns::node::USER_ID).text(&config.user_id)),
        );

    let sealed = cbc::encrypt(transaction_key, &flate::deflate(document.to_document().as_bytes()));
    Ok(BASE64.encode(sealed))
}

pub(crate) fn decode_b64(data: &str) -> Result<Vec<u8>> {
    let compact: String = data.split_whitespace().collect();
    BASE64
        .decode(compact.as_bytes())
        .map_err(|e| EbicsError::Protocol(format!("invalid Base64 order data: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeyVersion;

    fn bank_key() -> (rsa::RsaPrivateKey, BankPublicKey) {
        let private = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
        let public = BankPublicKey::new(KeyVersion::E002, private.to_public_key());
        (private, public)
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let (private, public) = bank_key();
        let payload = b"<Document>credit transfer</Document>".repeat(100);

        let sealed = seal(&payload, &public).unwrap();
        assert_eq!(sealed.segments.len(), 1);

        let opened = open(&sealed.segments, &sealed.wrapped_key, &private).unwrap();
        assert_eq!(opened.as_slice(), payload.as_slice());
    }

    #[test]
    fn test_seal_splits_large_payloads() {
        let (private, public) = bank_key();
        // Random bytes do not compress, so the ciphertext stays > 1 MiB.
        let mut payload = vec![0u8; SEGMENT_BYTES + 4096];
        crypto::secure_random(&mut payload);

        let sealed = seal(&payload, &public).unwrap();
        assert_eq!(sealed.segments.len(), 2);

        let opened = open(&sealed.segments, &sealed.wrapped_key, &private).unwrap();
        assert_eq!(opened.as_slice(), payload.as_slice());
    }

    #[test]
    fn test_open_rejects_wrong_key() {
        let (_, public) = bank_key();
        let other = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();

        let sealed = seal(b"payload", &public).unwrap();
        assert!(open(&sealed.segments, &sealed.wrapped_key, &other).is_err());
    }

    #[test]
    fn test_compress_b64_roundtrip() {
        let doc = b"<SignaturePubKeyOrderData/>";
        assert_eq!(decompress_b64(&compress_b64(doc)).unwrap(), doc);
    }

    #[test]
    fn test_key_digest_matches_bank_key() {
        let (_, public) = bank_key();
        let sealed = seal(b"x", &public).unwrap();
        assert_eq!(sealed.key_digest, BASE64.encode(public.digest));
    }
}
