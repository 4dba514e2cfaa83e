//! ZLIB compression of order data

use crate::error::{EbicsError, Result};
use miniz_oxide::deflate::compress_to_vec_zlib;
use miniz_oxide::inflate::decompress_to_vec_zlib;

const COMPRESSION_LEVEL: u8 = 6;

/// Deflate order data with a zlib wrapper
pub fn deflate(data: &[u8]) -> Vec<u8> {
    compress_to_vec_zlib(data, COMPRESSION_LEVEL)
}

/// Inflate zlib-wrapped order data
pub fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    decompress_to_vec_zlib(data)
        .map_err(|e| EbicsError::Crypto(format!("zlib inflate failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deflate_inflate_roundtrip() {
        let data = b"<Document>statement</Document>".repeat(64);
        let packed = deflate(&data);
        assert!(packed.len() < data.len());
        assert_eq!(inflate(&packed).unwrap(), data);
    }

    #[test]
    fn test_inflate_garbage_errors() {
        assert!(inflate(b"definitely not zlib").is_err());
    }
}
