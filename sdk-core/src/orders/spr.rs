//! SPR: suspend the user's access authorisation.
//!
//! The order data is a single ASCII space; the electronic signature over
//! that byte is what authorises the suspension.

use super::{Command, OrderAttribute};
use crate::config::EbicsConfig;
use crate::error::Result;
use crate::transaction::Direction;

pub struct Spr;

impl Command for Spr {
    fn order_type(&self) -> &'static str {
        "SPR"
    }

    fn attribute(&self) -> OrderAttribute {
        OrderAttribute::Uzhnn
    }

    fn direction(&self) -> Direction {
        Direction::Upload
    }

    fn upload_payload(&self, _config: &EbicsConfig) -> Result<Vec<u8>> {
        Ok(vec![b' '])
    }
}
