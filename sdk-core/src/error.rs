//! EBICS SDK error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EbicsError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to create request: {0}")]
    CreateRequest(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Cryptographic failure: {0}")]
    Crypto(String),

    #[error("Order data did not deserialize: {0}")]
    Deserialization(String),
}

impl From<rsa::Error> for EbicsError {
    fn from(e: rsa::Error) -> Self {
        EbicsError::Crypto(e.to_string())
    }
}

impl From<reqwest::Error> for EbicsError {
    fn from(e: reqwest::Error) -> Self {
        EbicsError::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EbicsError>;
