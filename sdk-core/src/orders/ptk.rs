//! PTK: download the customer protocol log.

use super::{Command, OrderAttribute, OrderResult};
use crate::error::{EbicsError, Result};
use crate::transaction::Direction;
use crate::xml::{ns, XmlElement};

use super::sta::DateRange;

#[derive(Default)]
pub struct Ptk {
    pub date_range: Option<DateRange>,
}

impl Command for Ptk {
    fn order_type(&self) -> &'static str {
        "PTK"
    }

    fn attribute(&self) -> OrderAttribute {
        OrderAttribute::Dzhnn
    }

    fn direction(&self) -> Direction {
        Direction::Download
    }

    fn order_params(&self) -> Option<XmlElement> {
        Some(match &self.date_range {
            Some(range) => range.order_params(),
            None => XmlElement::new(ns::node::STANDARD_ORDER_PARAMS),
        })
    }

    fn parse_order_data(&self, data: &[u8]) -> Result<OrderResult> {
        let text = String::from_utf8(data.to_vec())
            .map_err(|_| EbicsError::Deserialization("protocol log is not UTF-8".into()))?;
        Ok(OrderResult::Text(text))
    }
}
