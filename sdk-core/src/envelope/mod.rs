//! Order-data envelope: compression, transaction-key encryption,
//! segmentation and Base64 framing

pub mod codec;

pub use codec::{compress_b64, decompress_b64, open, seal, user_signature_data};

/// An upload payload after the full outbound pipeline: deflated, encrypted
/// under a fresh transaction key, cut into segments and Base64-encoded,
/// with the key wrapped for the bank.
pub struct SealedOrderData {
    /// Base64 segments, each covering at most
    /// [`crate::transaction::SEGMENT_BYTES`] of ciphertext
    pub segments: Vec<String>,
    /// The AES-128 session key, kept for encrypting the accompanying
    /// electronic signature data
    pub transaction_key: [u8; 16],
    /// Transaction key, RSA-wrapped with the bank encryption key, Base64
    pub wrapped_key: String,
    /// EBICS digest of the bank encryption key used for wrapping, Base64
    pub key_digest: String,
}
