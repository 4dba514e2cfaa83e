//! Per-order-type command objects.
//!
//! A command binds an order type to its attribute, transaction direction,
//! order parameters, upload payload and response deserializer. Request
//! construction is shared: the provided trait methods delegate to
//! [`crate::request`], and only the key management orders (INI, HIA, HPB)
//! override initialisation to produce their special envelopes.

pub mod cct;
pub mod cdd;
pub mod hia;
pub mod hpb;
pub mod hpd;
pub mod ini;
pub mod ptk;
pub mod spr;
pub mod sta;

use crate::config::{BankKeys, EbicsConfig, KeyPair};
use crate::error::{EbicsError, Result};
use crate::request::{self, UploadInitData};
use crate::transaction::Direction;
use crate::xml::{ns, XmlElement};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Serialize;

pub use cct::{CctParams, CctPaymentInfo, CreditTransfer};
pub use cdd::{CddParams, CddPaymentInfo, DirectDebit, SequenceType};
pub use hpd::{AccessParams, BankParams, ProtocolParams};
pub use sta::DateRange;

/// EBICS order attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderAttribute {
    /// Download, or order without attached signature data
    Dzhnn,
    /// Upload with attached electronic signature
    Ozhnn,
    /// Signature-only upload (SPR)
    Uzhnn,
    /// Unsecured key management upload
    Dznnn,
}

impl OrderAttribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderAttribute::Dzhnn => "DZHNN",
            OrderAttribute::Ozhnn => "OZHNN",
            OrderAttribute::Uzhnn => "UZHNN",
            OrderAttribute::Dznnn => "DZNNN",
        }
    }
}

/// Deserialized order data of a completed transaction
pub enum OrderResult {
    None,
    /// Textual order data (MT940 statements, protocol logs)
    Text(String),
    /// Bank keys from HPB
    BankKeys(BankKeys),
    /// Bank parameters from HPD
    BankParams(BankParams),
}

/// One EBICS order type
pub trait Command {
    /// Three-letter order code
    fn order_type(&self) -> &'static str;

    fn attribute(&self) -> OrderAttribute;

    fn direction(&self) -> Direction;

    /// Order parameters embedded in `OrderDetails`
    fn order_params(&self) -> Option<XmlElement> {
        Some(XmlElement::new(ns::node::STANDARD_ORDER_PARAMS))
    }

    /// Payload bytes for upload orders
    fn upload_payload(&self, _config: &EbicsConfig) -> Result<Vec<u8>> {
        Err(EbicsError::CreateRequest(format!(
            "{} is not an upload order",
            self.order_type()
        )))
    }

    /// Deserialize the decrypted, decompressed order data
    fn parse_order_data(&self, _data: &[u8]) -> Result<OrderResult> {
        Ok(OrderResult::None)
    }

    /// Initialisation document. `bank` is `None` only for the key
    /// management orders, which override this method.
    fn build_init_request(
        &self,
        config: &EbicsConfig,
        bank: Option<&BankKeys>,
        upload: Option<&UploadInitData<'_>>,
    ) -> Result<XmlElement> {
        let bank = bank.ok_or_else(|| {
            EbicsError::Configuration(format!(
                "bank keys required for {} but not loaded; run HPB first",
                self.order_type()
            ))
        })?;
        Ok(request::init_request(
            config,
            bank,
            self.order_type(),
            self.attribute(),
            self.order_params(),
            upload,
        ))
    }

    /// Transfer-phase document (upload orders carry a segment)
    fn build_transfer_request(
        &self,
        config: &EbicsConfig,
        transaction_id: &str,
        segment_number: usize,
        last_segment: bool,
        segment: Option<&str>,
    ) -> XmlElement {
        request::transfer_request(config, transaction_id, segment_number, last_segment, segment)
    }

    /// Receipt-phase document (download orders only)
    fn build_receipt_request(
        &self,
        config: &EbicsConfig,
        transaction_id: &str,
        receipt_code: u32,
    ) -> XmlElement {
        request::receipt_request(config, transaction_id, receipt_code)
    }
}

/// `PubKeyValue` fragment announcing one RSA public key
pub(crate) fn pub_key_value(key: &KeyPair) -> XmlElement {
    use rsa::traits::PublicKeyParts;

    let public = key.public();
    XmlElement::new(ns::node::PUB_KEY_VALUE)
        .child(
            XmlElement::new(ns::node::RSA_KEY_VALUE)
                .child(XmlElement::new(ns::node::MODULUS).text(BASE64.encode(public.n().to_bytes_be())))
                .child(
                    XmlElement::new(ns::node::EXPONENT).text(BASE64.encode(public.e().to_bytes_be())),
                ),
        )
        .child(
            XmlElement::new("TimeStamp")
                .text(key.created().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()),
        )
}

/// Read an announced RSA public key back out of a `PubKeyValue` fragment.
pub(crate) fn parse_pub_key_value(info: &XmlElement) -> Result<rsa::RsaPublicKey> {
    let modulus = decode_key_part(info, "Modulus")?;
    let exponent = decode_key_part(info, "Exponent")?;
    rsa::RsaPublicKey::new(
        rsa::BigUint::from_bytes_be(&modulus),
        rsa::BigUint::from_bytes_be(&exponent),
    )
    .map_err(|e| EbicsError::Deserialization(format!("announced RSA key rejected: {e}")))
}

fn decode_key_part(info: &XmlElement, part: &str) -> Result<Vec<u8>> {
    let text = info
        .find_text(part)
        .ok_or_else(|| EbicsError::Deserialization(format!("missing {part} in key data")))?;
    let compact: String = text.split_whitespace().collect();
    BASE64
        .decode(compact.as_bytes())
        .map_err(|e| EbicsError::Deserialization(format!("invalid Base64 in {part}: {e}")))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeyVersion;

    #[test]
    fn test_pub_key_value_roundtrip() {
        let key = KeyPair::new(
            KeyVersion::X002,
            rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap(),
        );
        let fragment = pub_key_value(&key);
        let parsed = parse_pub_key_value(&fragment).unwrap();
        assert_eq!(parsed, key.public());
    }

    #[test]
    fn test_parse_rejects_missing_parts() {
        let fragment = XmlElement::new("PubKeyValue");
        assert!(matches!(
            parse_pub_key_value(&fragment),
            Err(EbicsError::Deserialization(_))
        ));
    }
}
