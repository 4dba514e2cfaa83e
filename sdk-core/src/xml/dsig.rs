//! Enveloped XML-DSIG for EBICS requests and responses.
//!
//! EBICS constrains XML-DSIG to a single reference with the literal URI
//! `#xpointer(//*[@authenticate='true'])`, inclusive C14N 1.0, SHA-256 and
//! RSA PKCS#1 v1.5. The `AuthSignature` element wraps `ds:SignedInfo` and
//! `ds:SignatureValue` and sits between the header and the body of the
//! request document.

use super::c14n::canonicalize;
use super::dom::{XmlElement, XmlNode};
use super::ns;
use crate::crypto;
use crate::error::{EbicsError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

/// SHA-256 over the concatenated canonical forms of every element carrying
/// `authenticate="true"`, in document order.
pub fn digest_authenticated(doc: &XmlElement) -> Result<[u8; 32]> {
    let matched = authenticated_nodes(doc);
    if matched.is_empty() {
        return Err(EbicsError::CreateRequest(
            "document has no authenticated elements".into(),
        ));
    }

    let ns_map = document_namespaces(doc);
    let mut hasher = Sha256::new();
    for node in matched {
        hasher.update(canonicalize(&with_inherited_namespaces(node, &ns_map)).as_bytes());
    }
    Ok(hasher.finalize().into())
}

/// Produce the `AuthSignature` and insert it after the header.
pub fn sign(doc: &mut XmlElement, auth_key: &RsaPrivateKey) -> Result<()> {
    let digest = digest_authenticated(doc)?;
    let signed_info = build_signed_info(&BASE64.encode(digest));

    let ns_map = document_namespaces(doc);
    let canonical = canonicalize(&with_inherited_namespaces(&signed_info, &ns_map));
    let signed_info_digest: [u8; 32] = Sha256::digest(canonical.as_bytes()).into();
    let signature = crypto::rsa::sign(auth_key, &signed_info_digest)?;

    let auth_signature = XmlElement::new(ns::node::AUTH_SIGNATURE)
        .child(signed_info)
        .child(XmlElement::new(ns::node::SIGNATURE_VALUE).text(BASE64.encode(signature)));

    // Directly after the header, before the body.
    let at = doc
        .children
        .iter()
        .position(|n| matches!(n, XmlNode::Element(e) if e.local_name() == ns::node::HEADER))
        .map(|i| i + 1)
        .unwrap_or(doc.children.len());
    doc.children.insert(at, XmlNode::Element(auth_signature));
    Ok(())
}

/// Verify the `AuthSignature` of a received document against the bank
/// authentication public key. Any malformed input verifies as `false`.
pub fn verify(doc: &XmlElement, bank_auth: &RsaPublicKey) -> bool {
    let Some(auth_signature) = doc.find(ns::node::AUTH_SIGNATURE) else {
        return false;
    };
    let Some(signed_info) = auth_signature.find("SignedInfo") else {
        return false;
    };

    // The constrained reference must be spelled exactly.
    let reference_ok = signed_info
        .find("Reference")
        .and_then(|r| r.get_attr(ns::attr::URI))
        .map(|uri| uri == ns::AUTHENTICATED_REFERENCE)
        .unwrap_or(false);
    if !reference_ok {
        return false;
    }

    let Some(claimed_digest) = signed_info.find("DigestValue").map(|e| e.text_content()) else {
        return false;
    };
    let Ok(digest) = digest_authenticated(doc) else {
        return false;
    };
    if BASE64.encode(digest) != claimed_digest.trim() {
        return false;
    }

    let Some(signature_b64) = auth_signature
        .child_elements()
        .find(|e| e.local_name() == "SignatureValue")
        .map(|e| e.text_content())
    else {
        return false;
    };
    let compact: String = signature_b64.split_whitespace().collect();
    let Ok(signature) = BASE64.decode(compact.as_bytes()) else {
        return false;
    };

    let ns_map = document_namespaces(doc);
    let canonical = canonicalize(&with_inherited_namespaces(signed_info, &ns_map));
    let signed_info_digest: [u8; 32] = Sha256::digest(canonical.as_bytes()).into();
    crypto::rsa::verify(bank_auth, &signed_info_digest, &signature)
}

fn build_signed_info(digest_b64: &str) -> XmlElement {
    XmlElement::new(ns::node::SIGNED_INFO)
        .child(
            XmlElement::new(ns::node::CANONICALIZATION_METHOD)
                .attr(ns::attr::ALGORITHM, ns::ALG_C14N),
        )
        .child(
            XmlElement::new(ns::node::SIGNATURE_METHOD).attr(ns::attr::ALGORITHM, ns::ALG_RSA_SHA256),
        )
        .child(
            XmlElement::new(ns::node::REFERENCE)
                .attr(ns::attr::URI, ns::AUTHENTICATED_REFERENCE)
                .child(
                    XmlElement::new(ns::node::TRANSFORMS).child(
                        XmlElement::new(ns::node::TRANSFORM).attr(ns::attr::ALGORITHM, ns::ALG_C14N),
                    ),
                )
                .child(
                    XmlElement::new(ns::node::DIGEST_METHOD).attr(ns::attr::ALGORITHM, ns::ALG_SHA256),
                )
                .child(XmlElement::new(ns::node::DIGEST_VALUE).text(digest_b64)),
        )
}

fn authenticated_nodes(doc: &XmlElement) -> Vec<&XmlElement> {
    let mut out = Vec::new();
    collect_authenticated(doc, &mut out);
    out
}

fn collect_authenticated<'a>(el: &'a XmlElement, out: &mut Vec<&'a XmlElement>) {
    if el.get_attr(ns::attr::AUTHENTICATE) == Some("true") {
        out.push(el);
    }
    for child in el.child_elements() {
        collect_authenticated(child, out);
    }
}

/// Namespace declarations of the whole document, first occurrence winning.
/// EBICS documents declare everything on the root, so this is the in-scope
/// set of any extracted fragment.
fn document_namespaces(doc: &XmlElement) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::new();
    collect_namespaces(doc, &mut out);
    out
}

fn collect_namespaces(el: &XmlElement, out: &mut Vec<(String, String)>) {
    for (name, value) in &el.attributes {
        if (name == "xmlns" || name.starts_with("xmlns:"))
            && !out.iter().any(|(n, _)| n == name)
        {
            out.push((name.clone(), value.clone()));
        }
    }
    for child in el.child_elements() {
        collect_namespaces(child, out);
    }
}

/// Clone a fragment and re-declare on its root every namespace that was in
/// scope in the source document but is not declared locally. Without this
/// the prefixes of an extracted fragment become unbound and its canonical
/// form diverges from the one the peer computes.
fn with_inherited_namespaces(el: &XmlElement, ns_map: &[(String, String)]) -> XmlElement {
    let mut clone = el.clone();
    for (name, value) in ns_map {
        if clone.get_attr(name).is_none() {
            clone.set_attr(name.clone(), value.clone());
        }
    }
    clone
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> RsaPrivateKey {
        RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap()
    }

    fn sample_request() -> XmlElement {
        XmlElement::parse(
            r#"<ebicsRequest xmlns="urn:org:ebics:H004" xmlns:ds="http://www.w3.org/2000/09/xmldsig#" Version="H004" Revision="1"><header authenticate="true"><static><HostID>HOST01</HostID></static><mutable><TransactionPhase>Initialisation</TransactionPhase></mutable></header><body/></ebicsRequest>"#,
        )
        .unwrap()
    }

    #[test]
    fn test_sign_verify_roundtrip() {
        let key = test_key();
        let mut doc = sample_request();
        sign(&mut doc, &key).unwrap();

        // The signature lands between header and body.
        let names: Vec<_> = doc.child_elements().map(|e| e.local_name().to_string()).collect();
        assert_eq!(names, ["header", "AuthSignature", "body"]);

        assert!(verify(&doc, &key.to_public_key()));
    }

    #[test]
    fn test_survives_reparse() {
        let key = test_key();
        let mut doc = sample_request();
        sign(&mut doc, &key).unwrap();

        let reparsed = XmlElement::parse(&doc.to_document()).unwrap();
        assert!(verify(&reparsed, &key.to_public_key()));
    }

    #[test]
    fn test_tampered_subtree_fails() {
        let key = test_key();
        let mut doc = sample_request();
        sign(&mut doc, &key).unwrap();

        let mut serialized = doc.to_document();
        serialized = serialized.replace("HOST01", "HOST02");
        let tampered = XmlElement::parse(&serialized).unwrap();
        assert!(!verify(&tampered, &key.to_public_key()));
    }

    #[test]
    fn test_wrong_key_fails() {
        let key = test_key();
        let mut doc = sample_request();
        sign(&mut doc, &key).unwrap();
        assert!(!verify(&doc, &test_key().to_public_key()));
    }

    #[test]
    fn test_unauthenticated_document_rejected() {
        let key = test_key();
        let mut doc = XmlElement::parse(r#"<ebicsRequest><header/><body/></ebicsRequest>"#).unwrap();
        assert!(sign(&mut doc, &key).is_err());
    }

    #[test]
    fn test_digest_ignores_unauthenticated_whitespace() {
        // Whitespace outside the authenticated subtrees must not move the
        // digest.
        let a = XmlElement::parse(
            r#"<r xmlns="urn:x"><h authenticate="true"><v>1</v></h><body/></r>"#,
        )
        .unwrap();
        let b = XmlElement::parse(
            "<r xmlns=\"urn:x\">\n  <h authenticate=\"true\"><v>1</v></h>\n  <body/>\n</r>",
        )
        .unwrap();
        assert_eq!(
            digest_authenticated(&a).unwrap(),
            digest_authenticated(&b).unwrap()
        );
    }

    #[test]
    fn test_fragment_namespace_injection() {
        // The authenticated fragment uses a prefix declared on the root;
        // extraction must keep it bound.
        let doc = XmlElement::parse(
            r#"<r xmlns="urn:x" xmlns:ds="urn:ds"><h authenticate="true"><ds:X>1</ds:X></h></r>"#,
        )
        .unwrap();
        let ns_map = document_namespaces(&doc);
        let fragment = with_inherited_namespaces(doc.find("h").unwrap(), &ns_map);
        let canonical = canonicalize(&fragment);
        assert!(canonical.starts_with(r#"<h xmlns="urn:x" xmlns:ds="urn:ds" authenticate="true">"#));
    }
}
