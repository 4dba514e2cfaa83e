//! XML machinery: tree model, canonicalization and the EBICS signature

pub mod c14n;
pub mod dom;
pub mod dsig;
pub mod ns;

pub use dom::{XmlElement, XmlNode};
