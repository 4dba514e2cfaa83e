//! HPB: fetch the bank public keys.
//!
//! HPB runs before the client can know any bank key digest, so its request
//! uses the `ebicsNoPubKeyDigestsRequest` envelope; it is still signed with
//! the user authentication key. The response order data is a
//! `HPBResponseOrderData` document with the bank X002 and E002 keys.

use super::{parse_pub_key_value, Command, OrderAttribute, OrderResult};
use crate::config::{BankKeys, BankPublicKey, EbicsConfig, KeyVersion};
use crate::error::{EbicsError, Result};
use crate::request::{self, UploadInitData};
use crate::transaction::Direction;
use crate::xml::XmlElement;

pub struct Hpb;

impl Command for Hpb {
    fn order_type(&self) -> &'static str {
        "HPB"
    }

    fn attribute(&self) -> OrderAttribute {
        OrderAttribute::Dzhnn
    }

    fn direction(&self) -> Direction {
        Direction::Download
    }

    fn build_init_request(
        &self,
        config: &EbicsConfig,
        _bank: Option<&BankKeys>,
        _upload: Option<&UploadInitData<'_>>,
    ) -> Result<XmlElement> {
        Ok(request::no_pub_key_digests_request(
            config,
            self.order_type(),
            self.attribute(),
        ))
    }

    fn parse_order_data(&self, data: &[u8]) -> Result<OrderResult> {
        let text = std::str::from_utf8(data)
            .map_err(|_| EbicsError::Deserialization("HPB order data is not UTF-8".into()))?;
        let doc = XmlElement::parse(text)
            .map_err(|e| EbicsError::Deserialization(format!("HPB order data: {e}")))?;
        if doc.local_name() != "HPBResponseOrderData" {
            return Err(EbicsError::Deserialization(format!(
                "expected HPBResponseOrderData, got <{}>",
                doc.name
            )));
        }

        let auth_info = doc.find("AuthenticationPubKeyInfo").ok_or_else(|| {
            EbicsError::Deserialization("HPB data lacks AuthenticationPubKeyInfo".into())
        })?;
        let crypt_info = doc.find("EncryptionPubKeyInfo").ok_or_else(|| {
            EbicsError::Deserialization("HPB data lacks EncryptionPubKeyInfo".into())
        })?;

        expect_version(auth_info, "AuthenticationVersion", "X002")?;
        expect_version(crypt_info, "EncryptionVersion", "E002")?;

        Ok(OrderResult::BankKeys(BankKeys {
            auth: BankPublicKey::new(KeyVersion::X002, parse_pub_key_value(auth_info)?),
            crypt: BankPublicKey::new(KeyVersion::E002, parse_pub_key_value(crypt_info)?),
        }))
    }
}

fn expect_version(info: &XmlElement, element: &str, expected: &str) -> Result<()> {
    let version = info
        .find_text(element)
        .ok_or_else(|| EbicsError::Deserialization(format!("HPB data lacks {element}")))?;
    if version.trim() != expected {
        return Err(EbicsError::Deserialization(format!(
            "unsupported {element} {version:?}, only {expected} is supported"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::rsa::pubkey_digest;
    use crate::xml::ns;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine as _;
    use rsa::traits::PublicKeyParts;

    fn bank_order_data(auth: &rsa::RsaPublicKey, crypt: &rsa::RsaPublicKey) -> String {
        let key_value = |key: &rsa::RsaPublicKey| {
            XmlElement::new("PubKeyValue").child(
                XmlElement::new("ds:RSAKeyValue")
                    .child(XmlElement::new("ds:Modulus").text(BASE64.encode(key.n().to_bytes_be())))
                    .child(
                        XmlElement::new("ds:Exponent").text(BASE64.encode(key.e().to_bytes_be())),
                    ),
            )
        };
        XmlElement::new("HPBResponseOrderData")
            .attr("xmlns", ns::EBICS_H004)
            .attr("xmlns:ds", ns::DSIG)
            .child(
                XmlElement::new("AuthenticationPubKeyInfo")
                    .child(key_value(auth))
                    .child(XmlElement::new("AuthenticationVersion").text("X002")),
            )
            .child(
                XmlElement::new("EncryptionPubKeyInfo")
                    .child(key_value(crypt))
                    .child(XmlElement::new("EncryptionVersion").text("E002")),
            )
            .child(XmlElement::new("HostID").text("HOST01"))
            .to_document()
    }

    #[test]
    fn test_parse_bank_keys_with_digests() {
        let mut rng = rand::thread_rng();
        let auth = rsa::RsaPrivateKey::new(&mut rng, 2048).unwrap().to_public_key();
        let crypt = rsa::RsaPrivateKey::new(&mut rng, 2048).unwrap().to_public_key();

        let parsed = Hpb
            .parse_order_data(bank_order_data(&auth, &crypt).as_bytes())
            .unwrap();
        let OrderResult::BankKeys(keys) = parsed else {
            panic!("expected bank keys");
        };

        assert_eq!(keys.auth.key, auth);
        assert_eq!(keys.crypt.key, crypt);
        assert_eq!(keys.auth.digest, pubkey_digest(&auth));
        assert_eq!(keys.crypt.digest, pubkey_digest(&crypt));
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let mut rng = rand::thread_rng();
        let key = rsa::RsaPrivateKey::new(&mut rng, 2048).unwrap().to_public_key();
        let data = bank_order_data(&key, &key).replace("X002", "X001");
        assert!(matches!(
            Hpb.parse_order_data(data.as_bytes()),
            Err(EbicsError::Deserialization(_))
        ));
    }

    #[test]
    fn test_wrong_document_rejected() {
        assert!(Hpb.parse_order_data(b"<HIARequestOrderData/>").is_err());
        assert!(Hpb.parse_order_data(&[0xff, 0xfe]).is_err());
    }
}
