//! Typed builders for outbound EBICS documents.
//!
//! All element and attribute names are spelled per the EBICS schema; the
//! EBICS namespace is the default namespace and `ds:` prefixes XML-DSIG.
//! The header, `DataEncryptionInfo`, `SignatureData` and `TransferReceipt`
//! subtrees carry `authenticate="true"`; the engine signs the finished
//! document via [`crate::xml::dsig`].

use crate::config::{BankKeys, EbicsConfig};
use crate::crypto;
use crate::orders::OrderAttribute;
use crate::transaction::Phase;
use crate::xml::{ns, XmlElement};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

/// Upload-only parts of an initialisation request body.
pub struct UploadInitData<'a> {
    pub num_segments: usize,
    /// EBICS digest of the bank key that wrapped the transaction key, Base64
    pub key_digest: &'a str,
    /// RSA-wrapped transaction key, Base64
    pub wrapped_key: &'a str,
    /// Sealed `UserSignatureData`, Base64
    pub signature_data: &'a str,
    /// First order-data segment, Base64
    pub first_segment: &'a str,
}

/// Root element with the document namespaces and schema version.
fn document_root(config: &EbicsConfig, name: &str) -> XmlElement {
    XmlElement::new(name)
        .attr(ns::attr::XMLNS, config.version.namespace())
        .attr(ns::attr::XMLNS_DS, ns::DSIG)
        .attr(ns::attr::VERSION, config.version.as_str())
        .attr(ns::attr::REVISION, config.revision.to_string())
}

fn order_details(
    order_type: &str,
    attribute: OrderAttribute,
    params: Option<XmlElement>,
) -> XmlElement {
    let mut details = XmlElement::new(ns::node::ORDER_DETAILS)
        .child(XmlElement::new(ns::node::ORDER_TYPE).text(order_type))
        .child(XmlElement::new(ns::node::ORDER_ATTRIBUTE).text(attribute.as_str()));
    if let Some(params) = params {
        details.children.push(crate::xml::XmlNode::Element(params));
    }
    details
}

fn bank_pub_key_digests(bank: &BankKeys) -> XmlElement {
    XmlElement::new(ns::node::BANK_PUB_KEY_DIGESTS)
        .child(
            XmlElement::new(ns::node::AUTHENTICATION)
                .attr(ns::attr::VERSION, bank.auth.version.as_str())
                .attr(ns::attr::ALGORITHM, ns::ALG_SHA256)
                .text(BASE64.encode(bank.auth.digest)),
        )
        .child(
            XmlElement::new(ns::node::ENCRYPTION)
                .attr(ns::attr::VERSION, bank.crypt.version.as_str())
                .attr(ns::attr::ALGORITHM, ns::ALG_SHA256)
                .text(BASE64.encode(bank.crypt.digest)),
        )
}

fn identity(config: &EbicsConfig) -> [XmlElement; 3] {
    [
        XmlElement::new(ns::node::HOST_ID).text(&config.host_id),
        XmlElement::new(ns::node::PARTNER_ID).text(&config.partner_id),
        XmlElement::new(ns::node::USER_ID).text(&config.user_id),
    ]
}

/// `ebicsRequest` opening a transaction.
pub fn init_request(
    config: &EbicsConfig,
    bank: &BankKeys,
    order_type: &str,
    attribute: OrderAttribute,
    params: Option<XmlElement>,
    upload: Option<&UploadInitData<'_>>,
) -> XmlElement {
    let [host, partner, user] = identity(config);
    let mut stat = XmlElement::new(ns::node::STATIC)
        .child(host)
        .child(
            XmlElement::new(ns::node::NONCE).text(hex::encode_upper(crypto::random_nonce())),
        )
        .child(XmlElement::new(ns::node::TIMESTAMP).text(crypto::utc_timestamp()))
        .child(partner)
        .child(user)
        .child(order_details(order_type, attribute, params))
        .child(bank_pub_key_digests(bank))
        .child(XmlElement::new(ns::node::SECURITY_MEDIUM).text("0000"));
    if let Some(upload) = upload {
        stat = stat.child(
            XmlElement::new(ns::node::NUM_SEGMENTS).text(upload.num_segments.to_string()),
        );
    }

    let header = XmlElement::new(ns::node::HEADER)
        .attr(ns::attr::AUTHENTICATE, "true")
        .child(stat)
        .child(
            XmlElement::new(ns::node::MUTABLE).child(
                XmlElement::new(ns::node::TRANSACTION_PHASE)
                    .text(Phase::Initialisation.as_str()),
            ),
        );

    let body = match upload {
        None => XmlElement::new(ns::node::BODY),
        Some(upload) => XmlElement::new(ns::node::BODY).child(
            XmlElement::new(ns::node::DATA_TRANSFER)
                .child(
                    XmlElement::new(ns::node::DATA_ENCRYPTION_INFO)
                        .attr(ns::attr::AUTHENTICATE, "true")
                        .child(
                            XmlElement::new(ns::node::ENCRYPTION_PUB_KEY_DIGEST)
                                .attr(ns::attr::VERSION, "E002")
                                .attr(ns::attr::ALGORITHM, ns::ALG_SHA256)
                                .text(upload.key_digest),
                        )
                        .child(
                            XmlElement::new(ns::node::TRANSACTION_KEY).text(upload.wrapped_key),
                        ),
                )
                .child(
                    XmlElement::new(ns::node::SIGNATURE_DATA)
                        .attr(ns::attr::AUTHENTICATE, "true")
                        .text(upload.signature_data),
                )
                .child(XmlElement::new(ns::node::ORDER_DATA).text(upload.first_segment)),
        ),
    };

    document_root(config, ns::node::EBICS_REQUEST)
        .child(header)
        .child(body)
}

/// `ebicsRequest` for the Transfer phase. Upload transfers carry the
/// segment; download transfers request the next one.
pub fn transfer_request(
    config: &EbicsConfig,
    transaction_id: &str,
    segment_number: usize,
    last_segment: bool,
    segment: Option<&str>,
) -> XmlElement {
    let mut segment_el =
        XmlElement::new(ns::node::SEGMENT_NUMBER).text(segment_number.to_string());
    if last_segment {
        segment_el.set_attr(ns::attr::LAST_SEGMENT, "true");
    }

    let header = XmlElement::new(ns::node::HEADER)
        .attr(ns::attr::AUTHENTICATE, "true")
        .child(
            XmlElement::new(ns::node::STATIC)
                .child(XmlElement::new(ns::node::TRANSACTION_ID).text(transaction_id)),
        )
        .child(
            XmlElement::new(ns::node::MUTABLE)
                .child(
                    XmlElement::new(ns::node::TRANSACTION_PHASE).text(Phase::Transfer.as_str()),
                )
                .child(segment_el),
        );

    let body = match segment {
        None => XmlElement::new(ns::node::BODY),
        Some(data) => XmlElement::new(ns::node::BODY).child(
            XmlElement::new(ns::node::DATA_TRANSFER)
                .child(XmlElement::new(ns::node::ORDER_DATA).text(data)),
        ),
    };

    document_root(config, ns::node::EBICS_REQUEST)
        .child(header)
        .child(body)
}

/// `ebicsRequest` closing a download. `receipt_code` 0 acknowledges
/// success; non-zero reports a client-side processing failure.
pub fn receipt_request(config: &EbicsConfig, transaction_id: &str, receipt_code: u32) -> XmlElement {
    let header = XmlElement::new(ns::node::HEADER)
        .attr(ns::attr::AUTHENTICATE, "true")
        .child(
            XmlElement::new(ns::node::STATIC)
                .child(XmlElement::new(ns::node::TRANSACTION_ID).text(transaction_id)),
        )
        .child(
            XmlElement::new(ns::node::MUTABLE).child(
                XmlElement::new(ns::node::TRANSACTION_PHASE).text(Phase::Receipt.as_str()),
            ),
        );

    document_root(config, ns::node::EBICS_REQUEST)
        .child(header)
        .child(
            XmlElement::new(ns::node::BODY).child(
                XmlElement::new(ns::node::TRANSFER_RECEIPT)
                    .attr(ns::attr::AUTHENTICATE, "true")
                    .child(XmlElement::new(ns::node::RECEIPT_CODE).text(receipt_code.to_string())),
            ),
        )
}

/// `ebicsUnsecuredRequest` for INI and HIA: neither signed nor encrypted,
/// the body carries a deflated Base64 key document.
pub fn unsecured_request(
    config: &EbicsConfig,
    order_type: &str,
    attribute: OrderAttribute,
    order_data_b64: &str,
) -> XmlElement {
    let [host, partner, user] = identity(config);
    let header = XmlElement::new(ns::node::HEADER)
        .attr(ns::attr::AUTHENTICATE, "true")
        .child(
            XmlElement::new(ns::node::STATIC)
                .child(host)
                .child(partner)
                .child(user)
                .child(order_details(order_type, attribute, None))
                .child(XmlElement::new(ns::node::SECURITY_MEDIUM).text("0000")),
        )
        .child(XmlElement::new(ns::node::MUTABLE));

    XmlElement::new(ns::node::EBICS_UNSECURED_REQUEST)
        .attr(ns::attr::XMLNS, config.version.namespace())
        .attr(ns::attr::VERSION, config.version.as_str())
        .attr(ns::attr::REVISION, config.revision.to_string())
        .child(header)
        .child(
            XmlElement::new(ns::node::BODY).child(
                XmlElement::new(ns::node::DATA_TRANSFER)
                    .child(XmlElement::new(ns::node::ORDER_DATA).text(order_data_b64)),
            ),
        )
}

/// `ebicsNoPubKeyDigestsRequest` for HPB, which runs before any bank key
/// digest can be known.
pub fn no_pub_key_digests_request(
    config: &EbicsConfig,
    order_type: &str,
    attribute: OrderAttribute,
) -> XmlElement {
    let [host, partner, user] = identity(config);
    let header = XmlElement::new(ns::node::HEADER)
        .attr(ns::attr::AUTHENTICATE, "true")
        .child(
            XmlElement::new(ns::node::STATIC)
                .child(host)
                .child(
                    XmlElement::new(ns::node::NONCE)
                        .text(hex::encode_upper(crypto::random_nonce())),
                )
                .child(XmlElement::new(ns::node::TIMESTAMP).text(crypto::utc_timestamp()))
                .child(partner)
                .child(user)
                .child(order_details(order_type, attribute, None))
                .child(XmlElement::new(ns::node::SECURITY_MEDIUM).text("0000")),
        )
        .child(XmlElement::new(ns::node::MUTABLE));

    document_root(config, ns::node::EBICS_NO_PUB_KEY_DIGESTS_REQUEST)
        .child(header)
        .child(XmlElement::new(ns::node::BODY))
}
