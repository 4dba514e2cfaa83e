//! INI: announce the user electronic signature key.
//!
//! Runs before any bank key is known, so the request is an unsecured
//! envelope: no authentication signature, the order data only deflated and
//! Base64-encoded.

use super::{pub_key_value, Command, OrderAttribute};
use crate::config::{BankKeys, EbicsConfig};
use crate::envelope;
use crate::error::Result;
use crate::request::{self, UploadInitData};
use crate::transaction::Direction;
use crate::xml::{ns, XmlElement};

pub struct Ini;

impl Ini {
    /// The `SignaturePubKeyOrderData` document carried in the request body.
    pub fn order_data(config: &EbicsConfig) -> XmlElement {
        XmlElement::new(ns::node::SIGNATURE_PUB_KEY_ORDER_DATA)
            .attr(ns::attr::XMLNS, ns::S001)
            .attr(ns::attr::XMLNS_DS, ns::DSIG)
            .child(
                XmlElement::new(ns::node::SIGNATURE_PUB_KEY_INFO)
                    .child(pub_key_value(&config.sign_key))
                    .child(
                        XmlElement::new(ns::node::SIGNATURE_VERSION)
                            .text(config.sign_key.version().as_str()),
                    ),
            )
            .child(XmlElement::new(ns::node::PARTNER_ID).text(&config.partner_id))
            .child(XmlElement::new(ns::node::USER_ID).text(&config.user_id))
    }
}

impl Command for Ini {
    fn order_type(&self) -> &'static str {
        "INI"
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
