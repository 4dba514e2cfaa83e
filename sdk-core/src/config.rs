//! Client configuration: bank endpoint, user identity and key material

use crate::crypto::rsa::pubkey_digest;
use crate::error::{EbicsError, Result};
use chrono::{DateTime, Utc};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::Serialize;
use std::time::Duration;

/// EBICS schema generation spoken with the bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProtocolVersion {
    H004,
    H005,
}

impl ProtocolVersion {
    /// Default namespace of request/response documents for this generation
    pub fn namespace(&self) -> &'static str {
        match self {
            ProtocolVersion::H004 => crate::xml::ns::EBICS_H004,
            ProtocolVersion::H005 => crate::xml::ns::EBICS_H005,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolVersion::H004 => "H004",
            ProtocolVersion::H005 => "H005",
        }
    }
}

/// EBICS key version tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeyVersion {
    /// Electronic signature key
    A005,
    /// Identification and authentication key
    X002,
    /// Encryption key
    E002,
}

impl KeyVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyVersion::A005 => "A005",
            KeyVersion::X002 => "X002",
            KeyVersion::E002 => "E002",
        }
    }
}

/// One of the three user key pairs. Keys are supplied by the caller; this
/// SDK never generates them.
#[derive(Clone)]
pub struct KeyPair {
    version: KeyVersion,
    created: DateTime<Utc>,
    certificate: Option<Vec<u8>>,
    private: RsaPrivateKey,
}

impl KeyPair {
    pub fn new(version: KeyVersion, private: RsaPrivateKey) -> Self {
        Self {
            version,
            created: Utc::now(),
            certificate: None,
            private,
        }
    }

    /// Load a private key from a PKCS#8 or PKCS#1 PEM block.
    pub fn from_pem(version: KeyVersion, pem: &str) -> Result<Self> {
        let private = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| EbicsError::Configuration(format!("cannot parse key PEM: {e}")))?;
        Ok(Self::new(version, private))
    }

    /// Attach an X.509 certificate (DER) to this key.
    pub fn with_certificate(mut self, der: Vec<u8>) -> Self {
        self.certificate = Some(der);
        self
    }

    pub fn version(&self) -> KeyVersion {
        self.version
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn certificate(&self) -> Option<&[u8]> {
        self.certificate.as_deref()
    }

    pub fn private(&self) -> &RsaPrivateKey {
        &self.private
    }

    pub fn public(&self) -> RsaPublicKey {
        self.private.to_public_key()
    }

    /// EBICS digest of the public half.
    pub fn digest(&self) -> [u8; 32] {
        pubkey_digest(&self.public())
    }
}

/// A bank public key with its EBICS digest
#[derive(Clone)]
pub struct BankPublicKey {
    pub key: RsaPublicKey,
    pub version: KeyVersion,
    pub digest: [u8; 32],
}

impl BankPublicKey {
    pub fn new(version: KeyVersion, key: RsaPublicKey) -> Self {
        let digest = pubkey_digest(&key);
        Self {
            key,
            version,
            digest,
        }
    }
}

/// The bank keys learned from HPB: authentication (X002) and encryption
/// (E002) public keys.
#[derive(Clone)]
pub struct BankKeys {
    pub auth: BankPublicKey,
    pub crypt: BankPublicKey,
}

/// Immutable per-client settings. Constructed by the caller and handed to
/// [`crate::client::EbicsClient`].
#[derive(Clone)]
pub struct EbicsConfig {
    /// Bank endpoint URL
    pub url: String,
    pub version: ProtocolVersion,
    pub revision: u32,
    /// Accept invalid TLS certificates (test systems only)
    pub insecure_tls: bool,
    /// HTTP connect/read timeout
    pub timeout: Duration,
    pub host_id: String,
    pub partner_id: String,
    pub user_id: String,
    /// Electronic signature key (A005)
    pub sign_key: KeyPair,
    /// Authentication key (X002)
    pub auth_key: KeyPair,
    /// Encryption key (E002)
    pub crypt_key: KeyPair,
    /// Bank keys known from an earlier HPB, if any
    pub bank_keys: Option<BankKeys>,
}

impl EbicsConfig {
    pub fn new(
        url: impl Into<String>,
        host_id: impl Into<String>,
        partner_id: impl Into<String>,
        user_id: impl Into<String>,
        sign_key: KeyPair,
        auth_key: KeyPair,
        crypt_key: KeyPair,
    ) -> Self {
        Self {
            url: url.into(),
            version: ProtocolVersion::H004,
            revision: 1,
            insecure_tls: false,
            timeout: Duration::from_secs(30),
            host_id: host_id.into(),
            partner_id: partner_id.into(),
            user_id: user_id.into(),
            sign_key,
            auth_key,
            crypt_key,
            bank_keys: None,
        }
    }

    /// Check identifiers and key slots before the first transaction.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("url", &self.url),
            ("host_id", &self.host_id),
            ("partner_id", &self.partner_id),
            ("user_id", &self.user_id),
        ] {
            if value.is_empty() {
                return Err(EbicsError::Configuration(format!("{name} must not be empty")));
            }
        }
        for (slot, key, expected) in [
            ("sign_key", &self.sign_key, KeyVersion::A005),
            ("auth_key", &self.auth_key, KeyVersion::X002),
            ("crypt_key", &self.crypt_key, KeyVersion::E002),
        ] {
            if key.version() != expected {
                return Err(EbicsError::Configuration(format!(
                    "{slot} must be a {} key, got {}",
                    expected.as_str(),
                    key.version().as_str()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_keys() -> (KeyPair, KeyPair, KeyPair) {
        let mut rng = rand::thread_rng();
        (
            KeyPair::new(KeyVersion::A005, RsaPrivateKey::new(&mut rng, 2048).unwrap()),
            KeyPair::new(KeyVersion::X002, RsaPrivateKey::new(&mut rng, 2048).unwrap()),
            KeyPair::new(KeyVersion::E002, RsaPrivateKey::new(&mut rng, 2048).unwrap()),
        )
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        let (sign, auth, crypt) = test_keys();
        let config = EbicsConfig::new(
            "https://ebics.example/ebicsweb",
            "HOST01",
            "PARTNER1",
            "USER1",
            sign,
            auth,
            crypt,
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_identity() {
        let (sign, auth, crypt) = test_keys();
        let config = EbicsConfig::new("https://ebics.example", "HOST01", "", "USER1", sign, auth, crypt);
        assert!(matches!(
            config.validate(),
            Err(EbicsError::Configuration(_))
        ));
    }

    #[test]
    fn test_validate_rejects_swapped_key_slots() {
        let (sign, auth, crypt) = test_keys();
        let config = EbicsConfig::new(
            "https://ebics.example",
            "HOST01",
            "PARTNER1",
            "USER1",
            auth,
            sign,
            crypt,
        );
        assert!(matches!(
            config.validate(),
            Err(EbicsError::Configuration(_))
        ));
    }

    #[test]
    fn test_keypair_pem_roundtrip() {
        use rsa::pkcs8::EncodePrivateKey;

        let key = RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
        let pem = key.to_pkcs8_pem(rsa::pkcs8::LineEnding::LF).unwrap();

        let pair = KeyPair::from_pem(KeyVersion::X002, &pem).unwrap();
        assert_eq!(pair.public(), key.to_public_key());
        assert!(KeyPair::from_pem(KeyVersion::X002, "not a pem").is_err());
    }

    #[test]
    fn test_bank_public_key_digest_matches_rule() {
        let (_, _, crypt) = test_keys();
        let bank = BankPublicKey::new(KeyVersion::E002, crypt.public());
        assert_eq!(bank.digest, crypt.digest());
    }
}
