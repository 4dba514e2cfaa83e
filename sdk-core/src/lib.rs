//! EBICS client SDK core library.
//!
//! Establishes a cryptographic identity with a bank (INI/HIA), fetches the
//! bank keys (HPB) and runs signed, encrypted, compressed order
//! transactions over HTTPS (HPD, PTK, STA, CCT, CDD, SPR). The transaction
//! dialog, the XML signature and the order-data envelope follow EBICS
//! H004/H005.

pub mod client;
pub mod config;
pub mod crypto;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod orders;
pub mod request;
pub mod response;
pub mod transaction;
pub mod transport;
pub mod xml;

// Re-exports
pub use client::{
    EbicsClient, HpbResponse, HpdResponse, KeyManagementResponse, TextOrderResponse,
    UploadResponse,
};
pub use config::{
    BankKeys, BankPublicKey, EbicsConfig, KeyPair, KeyVersion, ProtocolVersion,
};
pub use error::{EbicsError, Result};
pub use orders::{
    BankParams, CctParams, CctPaymentInfo, CddParams, CddPaymentInfo, CreditTransfer, DateRange,
    DirectDebit, SequenceType,
};
pub use response::ReturnCodes;
pub use transport::Transport;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
