//! A small owned XML tree.
//!
//! EBICS documents are small and their schema is stable, so requests are
//! emitted and responses consumed through this tree directly instead of a
//! reflective serializer. Parsing is a single `xmlparser` pass; text nodes
//! are kept verbatim because signature digests are computed over the
//! canonical form of received subtrees.

use crate::error::{EbicsError, Result};
use xmlparser::{ElementEnd, Token, Tokenizer};

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    /// Qualified name, e.g. `header` or `ds:SignedInfo`
    pub name: String,
    /// Attributes in document/insertion order, values unescaped
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder-style child element
    pub fn child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Builder-style text content
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.get_attr(name).is_some()
    }

    /// Name without its prefix
    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// Concatenated text of direct children
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            if let XmlNode::Text(t) = node {
                out.push_str(t);
            }
        }
        out
    }

    /// First descendant-or-self element with the given local name, in
    /// document order.
    pub fn find(&self, local: &str) -> Option<&XmlElement> {
        if self.local_name() == local {
            return Some(self);
        }
        for child in self.child_elements() {
            if let Some(found) = child.find(local) {
                return Some(found);
            }
        }
        None
    }

    /// All descendant-or-self elements with the given local name, in
    /// document order.
    pub fn find_all<'a>(&'a self, local: &str) -> Vec<&'a XmlElement> {
        let mut out = Vec::new();
        self.collect_named(local, &mut out);
        out
    }

    fn collect_named<'a>(&'a self, local: &str, out: &mut Vec<&'a XmlElement>) {
        if self.local_name() == local {
            out.push(self);
        }
        for child in self.child_elements() {
            child.collect_named(local, out);
        }
    }

    /// Text of the first descendant with the given local name
    pub fn find_text(&self, local: &str) -> Option<String> {
        self.find(local).map(|e| e.text_content())
    }

    /// Parse a complete document; returns the root element.
    pub fn parse(xml: &str) -> Result<XmlElement> {
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        for token in Tokenizer::from(xml) {
            let token =
                token.map_err(|e| EbicsError::Protocol(format!("malformed XML: {e}")))?;
            match token {
                Token::ElementStart { prefix, local, .. } => {
                    stack.push(XmlElement::new(qualify(prefix.as_str(), local.as_str())));
                }
                Token::Attribute {
                    prefix,
                    local,
                    value,
                    ..
                } => {
                    if let Some(current) = stack.last_mut() {
                        current.attributes.push((
                            qualify(prefix.as_str(), local.as_str()),
                            unescape(value.as_str()),
                        ));
                    }
                }
                Token::ElementEnd { end, .. } => match end {
                    ElementEnd::Open => {}
                    ElementEnd::Close(..) | ElementEnd::Empty => {
                        let done = stack
                            .pop()
                            .ok_or_else(|| EbicsError::Protocol("unbalanced XML".into()))?;
                        match stack.last_mut() {
                            Some(parent) => parent.children.push(XmlNode::Element(done)),
                            None => root = Some(done),
                        }
                    }
                },
                Token::Text { text } => {
                    if let Some(current) = stack.last_mut() {
                        current.children.push(XmlNode::Text(unescape(text.as_str())));
                    }
                }
                Token::Cdata { text, .. } => {
                    if let Some(current) = stack.last_mut() {
                        current.children.push(XmlNode::Text(text.as_str().to_string()));
                    }
                }
                // Prolog, comments and DTDs carry nothing we consume.
                _ => {}
            }
        }

        root.ok_or_else(|| EbicsError::Protocol("empty XML document".into()))
    }

    /// Serialize the subtree (no XML declaration).
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write(&mut out);
        out
    }

    /// Serialize as a complete document with an XML declaration.
    pub fn to_document(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
        self.write(&mut out);
        out
    }

    fn write(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (name, value) in &self.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                XmlNode::Element(e) => e.write(out),
                XmlNode::Text(t) => out.push_str(&escape_text(t)),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

fn qualify(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_string()
    } else {
        format!("{prefix}:{local}")
    }
}

/// Escape character data per canonical XML
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            c => out.push(c),
        }
    }
    out
}

/// Escape an attribute value per canonical XML
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            c => out.push(c),
        }
    }
    out
}

fn unescape(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match rest.find(';') {
            Some(end) => {
                let entity = &rest[1..end];
                match entity {
                    "amp" => out.push('&'),
                    "lt" => out.push('<'),
                    "gt" => out.push('>'),
                    "quot" => out.push('"'),
                    "apos" => out.push('\''),
                    _ => {
                        let parsed = entity
                            .strip_prefix("#x")
                            .and_then(|h| u32::from_str_radix(h, 16).ok())
                            .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                            .and_then(char::from_u32);
                        match parsed {
                            Some(c) => out.push(c),
                            // Unknown entity, keep it verbatim.
                            None => {
                                out.push('&');
                                out.push_str(entity);
                                out.push(';');
                            }
                        }
                    }
                }
                rest = &rest[end + 1..];
            }
            None => {
                out.push_str(rest);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_document() {
        let root = XmlElement::parse(
            r#"<?xml version="1.0"?>
<ebicsResponse xmlns="urn:org:ebics:H004" Version="H004">
  <header authenticate="true"><static><TransactionID>A1B2</TransactionID></static></header>
  <body/>
</ebicsResponse>"#,
        )
        .unwrap();

        assert_eq!(root.name, "ebicsResponse");
        assert_eq!(root.get_attr("Version"), Some("H004"));
        assert_eq!(root.find_text("TransactionID").unwrap(), "A1B2");
        assert!(root.find("body").unwrap().children.is_empty());
    }

    #[test]
    fn test_prefixed_names() {
        let root =
            XmlElement::parse(r#"<a xmlns:ds="urn:x"><ds:DigestValue>q80=</ds:DigestValue></a>"#)
                .unwrap();
        let digest = root.find("DigestValue").unwrap();
        assert_eq!(digest.name, "ds:DigestValue");
        assert_eq!(digest.local_name(), "DigestValue");
    }

    #[test]
    fn test_entity_roundtrip() {
        let root = XmlElement::parse("<t a=\"x&quot;y\">a &amp; b &lt; c &#x41;</t>").unwrap();
        assert_eq!(root.get_attr("a"), Some("x\"y"));
        assert_eq!(root.text_content(), "a & b < c A");

        let emitted = root.to_xml();
        let again = XmlElement::parse(&emitted).unwrap();
        assert_eq!(again, root);
    }

    #[test]
    fn test_builder_emission() {
        let doc = XmlElement::new("OrderDetails")
            .child(XmlElement::new("OrderType").text("STA"))
            .child(XmlElement::new("OrderAttribute").text("DZHNN"));
        assert_eq!(
            doc.to_xml(),
            "<OrderDetails><OrderType>STA</OrderType><OrderAttribute>DZHNN</OrderAttribute></OrderDetails>"
        );
    }

    #[test]
    fn test_find_document_order() {
        let root = XmlElement::parse("<r><a><x>1</x></a><x>2</x></r>").unwrap();
        assert_eq!(root.find("x").unwrap().text_content(), "1");
        let all = root.find_all("x");
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].text_content(), "2");
    }

    #[test]
    fn test_malformed_is_error() {
        assert!(XmlElement::parse("<a><b></a>").is_err());
        assert!(XmlElement::parse("").is_err());
    }
}
