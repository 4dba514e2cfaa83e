//! Per-transaction state

use crate::error::{EbicsError, Result};
use zeroize::Zeroizing;

/// Largest encrypted chunk transmitted in one EBICS phase. Chunks are cut
/// before Base64 encoding.
pub const SEGMENT_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Upload,
    Download,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initialisation,
    Transfer,
    Receipt,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Initialisation => "Initialisation",
            Phase::Transfer => "Transfer",
            Phase::Receipt => "Receipt",
        }
    }
}

/// State of one logical EBICS transaction, alive for the duration of the
/// Initialisation/Transfer/Receipt dialog and dropped at its end.
pub struct TransactionContext {
    pub direction: Direction,
    /// Upload: pre-encrypted Base64 segments to send.
    /// Download: Base64 chunks received so far, by ascending segment number.
    pub segments: Vec<String>,
    /// Bank-assigned, 16 hex characters; absent until the first response
    pub transaction_id: Option<String>,
    pub num_segments: usize,
    pub segment_number: usize,
    pub last_segment: bool,
    /// AES-128 session key. Generated client-side for uploads and constant
    /// for the life of the transaction; unwrapped from the response for
    /// downloads.
    pub transaction_key: Zeroizing<[u8; 16]>,
    pub phase: Phase,
}

impl TransactionContext {
    pub fn upload(segments: Vec<String>, transaction_key: [u8; 16]) -> Self {
        let num_segments = segments.len();
        Self {
            direction: Direction::Upload,
            segments,
            transaction_id: None,
            num_segments,
            segment_number: 0,
            last_segment: num_segments <= 1,
            transaction_key: Zeroizing::new(transaction_key),
            phase: Phase::Initialisation,
        }
    }

    pub fn download() -> Self {
        Self {
            direction: Direction::Download,
            segments: Vec::new(),
            transaction_id: None,
            num_segments: 0,
            segment_number: 0,
            last_segment: false,
            transaction_key: Zeroizing::new([0u8; 16]),
            phase: Phase::Initialisation,
        }
    }

    /// The transaction id once assigned; a transfer or receipt before the
    /// bank assigned one is a protocol violation.
    pub fn require_transaction_id(&self) -> Result<&str> {
        self.transaction_id
            .as_deref()
            .ok_or_else(|| EbicsError::Protocol("no TransactionID assigned yet".into()))
    }

    /// Record the bank-assigned transaction id from the initialisation
    /// response, rejecting contradictions on later phases.
    pub fn adopt_transaction_id(&mut self, id: &str) -> Result<()> {
        match &self.transaction_id {
            None => {
                if id.len() != 16 || !id.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return Err(EbicsError::Protocol(format!(
                        "TransactionID is not 16 hex characters: {id:?}"
                    )));
                }
                self.transaction_id = Some(id.to_string());
                Ok(())
            }
            Some(known) if known == id => Ok(()),
            Some(known) => Err(EbicsError::Protocol(format!(
                "TransactionID changed mid-transaction: {known} -> {id}"
            ))),
        }
    }

    /// Advance to the next segment to transmit or request.
    pub fn next_segment(&mut self) -> Result<usize> {
        if self.segment_number >= self.num_segments {
            return Err(EbicsError::Protocol(format!(
                "segment {} requested but transaction has {}",
                self.segment_number + 1,
                self.num_segments
            )));
        }
        self.segment_number += 1;
        self.last_segment = self.segment_number == self.num_segments;
        Ok(self.segment_number)
    }
}
