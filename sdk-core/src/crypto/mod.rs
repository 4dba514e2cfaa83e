//! Cryptographic primitives for the EBICS envelope

pub mod cbc;
pub mod flate;
pub mod rsa;

use rand::RngCore;

/// Length of EBICS nonces and transaction keys.
pub const NONCE_BYTES: usize = 16;

/// Fill buffer with cryptographically secure random bytes
pub fn secure_random(buf: &mut [u8]) {
    rand::thread_rng().fill_bytes(buf);
}

/// Generate a random nonce for a request header
pub fn random_nonce() -> [u8; NONCE_BYTES] {
    let mut nonce = [0u8; NONCE_BYTES];
    secure_random(&mut nonce);
    nonce
}

/// Generate a fresh AES-128 transaction key for an upload
pub fn random_transaction_key() -> [u8; NONCE_BYTES] {
    random_nonce()
}

/// Current UTC time in the EBICS timestamp form `yyyy-MM-ddTHH:mm:ss.fffZ`
pub fn utc_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_length_and_variance() {
        let a = random_nonce();
        let b = random_nonce();
        assert_eq!(a.len(), 16);
        assert_ne!(a, b);
    }

    #[test]
    fn test_timestamp_shape() {
        let ts = utc_timestamp();
        // 2024-01-02T03:04:05.678Z
        assert_eq!(ts.len(), 24);
        assert!(ts.ends_with('Z'));
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], "T");
        assert_eq!(&ts[19..20], ".");
    }
}
