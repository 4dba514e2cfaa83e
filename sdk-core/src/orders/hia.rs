//! HIA: announce the authentication (X002) and encryption (E002) keys.

use super::{pub_key_value, Command, OrderAttribute};
use crate::config::{BankKeys, EbicsConfig};
use crate::envelope;
use crate::error::Result;
use crate::request::{self, UploadInitData};
use crate::transaction::Direction;
use crate::xml::{ns, XmlElement};

pub struct Hia;

impl Hia {
    /// The `HIARequestOrderData` document carried in the request body.
    pub fn order_data(config: &EbicsConfig) -> XmlElement {
        XmlElement::new(ns::node::HIA_REQUEST_ORDER_DATA)
            .attr(ns::attr::XMLNS, config.version.namespace())
            .attr(ns::attr::XMLNS_DS, ns::DSIG)
            .child(
                XmlElement::new(ns::node::AUTHENTICATION_PUB_KEY_INFO)
                    .child(pub_key_value(&config.auth_key))
                    .child(
                        XmlElement::new(ns::node::AUTHENTICATION_VERSION)
                            .text(config.auth_key.version().as_str()),
                    ),
            )
            .child(
                XmlElement::new(ns::node::ENCRYPTION_PUB_KEY_INFO)
                    .child(pub_key_value(&config.crypt_key))
                    .child(
                        XmlElement::new(ns::node::ENCRYPTION_VERSION)
                            .text(config.crypt_key.version().as_str()),
                    ),
            )
            .child(XmlElement::new(ns::node::PARTNER_ID).text(&config.partner_id))
            .child(XmlElement::new(ns::node::USER_ID).text(&config.user_id))
    }
}

impl Command for Hia {
    fn order_type(&self) -> &'static str {
        "HIA"
    }

    fn attribute(&self) -> OrderAttribute {
        OrderAttribute::Dznnn
    }

    fn direction(&self) -> Direction {
        Direction::Upload
    }

    fn build_init_request(
        &self,
        config: &EbicsConfig,
        _bank: Option<&BankKeys>,
        _upload: Option<&UploadInitData<'_>>,
    ) -> Result<XmlElement> {
        let data = envelope::compress_b64(Self::order_data(config).to_document().as_bytes());
        Ok(request::unsecured_request(
            config,
            self.order_type(),
            self.attribute(),
            &data,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KeyPair, KeyVersion};

    #[test]
    fn test_hia_order_data_announces_both_keys() {
        let mut rng = rand::thread_rng();
        let config = EbicsConfig::new(
            "https://ebics.example/ebicsweb",
            "HOST01",
            "PARTNER1",
            "USER1",
            KeyPair::new(KeyVersion::A005, rsa::RsaPrivateKey::new(&mut rng, 2048).unwrap()),
            KeyPair::new(KeyVersion::X002, rsa::RsaPrivateKey::new(&mut rng, 2048).unwrap()),
            KeyPair::new(KeyVersion::E002, rsa::RsaPrivateKey::new(&mut rng, 2048).unwrap()),
        );

        let data = Hia::order_data(&config);
        assert_eq!(data.find_text("AuthenticationVersion").unwrap(), "X002");
        assert_eq!(data.find_text("EncryptionVersion").unwrap(), "E002");

        let auth_info = data.find("AuthenticationPubKeyInfo").unwrap();
        let announced = super::super::parse_pub_key_value(auth_info).unwrap();
        assert_eq!(announced, config.auth_key.public());

        let doc = Hia.build_init_request(&config, None, None).unwrap();
        assert_eq!(doc.name, "ebicsUnsecuredRequest");
        assert_eq!(doc.find_text("OrderType").unwrap(), "HIA");
    }
}
