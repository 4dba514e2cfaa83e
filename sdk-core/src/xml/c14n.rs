//! Canonical XML 1.0 (inclusive) serialization.
//!
//! Implements the subset of C14N that EBICS documents exercise: attribute
//! ordering, canonical escaping, empty elements in start/end-tag form, and
//! suppression of namespace declarations already rendered by an output
//! ancestor. Comments are not carried by the tree, so output is always the
//! comment-less canonical form.

use super::dom::{escape_attr, escape_text, XmlElement, XmlNode};
use std::collections::HashMap;

/// Canonicalize a subtree. Namespace context inherited from ancestors must
/// already be present as `xmlns` attributes on `root` (see
/// [`crate::xml::dsig`] for fragment extraction).
pub fn canonicalize(root: &XmlElement) -> String {
    let mut out = String::new();
    write_canonical(root, &HashMap::new(), &mut out);
    out
}

fn write_canonical(el: &XmlElement, rendered_ns: &HashMap<String, String>, out: &mut String) {
    // Split the attribute list into namespace declarations and plain
    // attributes.
    let mut ns_decls: Vec<(&str, &str)> = Vec::new();
    let mut attrs: Vec<(&str, &str)> = Vec::new();
    for (name, value) in &el.attributes {
        if name == "xmlns" || name.starts_with("xmlns:") {
            ns_decls.push((name.as_str(), value.as_str()));
        } else {
            attrs.push((name.as_str(), value.as_str()));
        }
    }

    // A declaration is output only when it changes the value visible from
    // the nearest output ancestor.
    let mut scope = rendered_ns.clone();
    ns_decls.retain(|(name, value)| {
        let prefix = name.strip_prefix("xmlns:").unwrap_or("");
        let inherited = rendered_ns.get(prefix).map(String::as_str).unwrap_or("");
        let changed = inherited != *value;
        if changed {
            scope.insert(prefix.to_string(), value.to_string());
        }
        changed
    });

    // Namespace nodes first, default namespace before prefixed ones, then
    // attributes by (namespace URI, local name).
    ns_decls.sort_by(|a, b| a.0.cmp(b.0));
    attrs.sort_by(|a, b| attr_sort_key(a.0, &scope).cmp(&attr_sort_key(b.0, &scope)));

    out.push('<');
    out.push_str(&el.name);
    for (name, value) in ns_decls.iter().chain(attrs.iter()) {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }
    out.push('>');

    for child in &el.children {
        match child {
            XmlNode::Element(e) => write_canonical(e, &scope, out),
            XmlNode::Text(t) => out.push_str(&escape_text(t)),
        }
    }

    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
}

fn attr_sort_key(name: &str, scope: &HashMap<String, String>) -> (String, String) {
    match name.split_once(':') {
        Some((prefix, local)) => {
            let uri = scope.get(prefix).cloned().unwrap_or_default();
            (uri, local.to_string())
        }
        // Unprefixed attributes have no namespace and sort first.
        None => (String::new(), name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_are_sorted() {
        let el = XmlElement::parse(r#"<e b="2" a="1" xmlns:z="urn:z" xmlns="urn:d"/>"#).unwrap();
        assert_eq!(
            canonicalize(&el),
            r#"<e xmlns="urn:d" xmlns:z="urn:z" a="1" b="2"></e>"#
        );
    }

    #[test]
    fn test_empty_element_form() {
        let el = XmlElement::parse("<a><b/></a>").unwrap();
        assert_eq!(canonicalize(&el), "<a><b></b></a>");
    }

    #[test]
    fn test_inherited_declaration_suppressed() {
        let el = XmlElement::parse(r#"<a xmlns="urn:x"><b xmlns="urn:x"><c/></b></a>"#).unwrap();
        assert_eq!(
            canonicalize(&el),
            r#"<a xmlns="urn:x"><b><c></c></b></a>"#
        );
    }

    #[test]
    fn test_changed_declaration_rendered() {
        let el = XmlElement::parse(r#"<a xmlns="urn:x"><b xmlns="urn:y"/></a>"#).unwrap();
        assert_eq!(
            canonicalize(&el),
            r#"<a xmlns="urn:x"><b xmlns="urn:y"></b></a>"#
        );
    }

    #[test]
    fn test_escaping() {
        let el = XmlElement::parse("<a t=\"x\ty\">1 &lt; 2 &amp; 3</a>").unwrap();
        assert_eq!(canonicalize(&el), "<a t=\"x&#x9;y\">1 &lt; 2 &amp; 3</a>");
    }

    #[test]
    fn test_logically_identical_documents_agree() {
        // Same infoset, different attribute order and self-closing form.
        let a = XmlElement::parse(r#"<h auth="true" v="1"><s/></h>"#).unwrap();
        let b = XmlElement::parse(r#"<h v="1" auth="true"><s></s></h>"#).unwrap();
        assert_eq!(canonicalize(&a), canonicalize(&b));
    }
}
