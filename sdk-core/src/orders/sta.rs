//! STA: download account statements (MT940).

use super::{Command, OrderAttribute, OrderResult};
use crate::error::{EbicsError, Result};
use crate::transaction::Direction;
use crate::xml::{ns, XmlElement};
use chrono::NaiveDate;
use serde::Serialize;

/// Inclusive booking-date window for statement and log downloads
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub(crate) fn order_params(&self) -> XmlElement {
        XmlElement::new(ns::node::STANDARD_ORDER_PARAMS).child(
            XmlElement::new(ns::node::DATE_RANGE)
                .child(XmlElement::new(ns::node::START).text(self.start.format("%Y-%m-%d").to_string()))
                .child(XmlElement::new(ns::node::END).text(self.end.format("%Y-%m-%d").to_string())),
        )
    }
}

#[derive(Default)]
pub struct Sta {
    pub date_range: Option<DateRange>,
}

impl Command for Sta {
    fn order_type(&self) -> &'static str {
        "STA"
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
            .map_err(|_| EbicsError::Deserialization("MT940 data is not UTF-8".into()))?;
        Ok(OrderResult::Text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_range_params() {
        let sta = Sta {
            date_range: Some(DateRange {
                start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            }),
        };
        let params = sta.order_params().unwrap();
        assert_eq!(params.find_text("Start").unwrap(), "2024-01-01");
        assert_eq!(params.find_text("End").unwrap(), "2024-01-31");
    }

    #[test]
    fn test_without_range_params_are_empty() {
        let params = Sta::default().order_params().unwrap();
        assert!(params.children.is_empty());
    }

    #[test]
    fn test_statement_text_passes_through() {
        let mt940 = ":20:951110\r\n:25:45050050/76198810\r\n:28C:27/01\r\n";
        let OrderResult::Text(text) = Sta::default().parse_order_data(mt940.as_bytes()).unwrap()
        else {
            panic!("expected text");
        };
        assert_eq!(text, mt940);
    }
}
