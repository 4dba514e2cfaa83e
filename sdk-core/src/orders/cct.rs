//! CCT: upload a SEPA credit transfer (pain.001.001.03).

use super::{Command, OrderAttribute};
use crate::config::EbicsConfig;
use crate::crypto;
use crate::error::{EbicsError, Result};
use crate::transaction::Direction;
use crate::xml::{ns, XmlElement};
use chrono::NaiveDate;
use serde::Serialize;

/// One credit transfer instruction
#[derive(Debug, Clone, Serialize)]
pub struct CreditTransfer {
    pub end_to_end_id: String,
    /// Decimal amount as a string, e.g. `"1234.56"`
    pub amount: String,
    pub currency: String,
    pub creditor_name: String,
    pub creditor_iban: String,
    pub creditor_bic: Option<String>,
    pub remittance_info: Option<String>,
}

/// A group of transfers drawn from one debtor account on one date
#[derive(Debug, Clone, Serialize)]
pub struct CctPaymentInfo {
    pub payment_info_id: String,
    pub debtor_name: String,
    pub debtor_iban: String,
    pub debtor_bic: String,
    pub requested_execution_date: NaiveDate,
    pub transfers: Vec<CreditTransfer>,
}

/// Parameters of a credit transfer order
#[derive(Debug, Clone, Serialize)]
pub struct CctParams {
    pub initiating_party: String,
    pub payment_infos: Vec<CctPaymentInfo>,
}

impl CctParams {
    fn transaction_count(&self) -> usize {
        self.payment_infos.iter().map(|p| p.transfers.len()).sum()
    }

    /// Emit the pain.001.001.03 document.
    pub fn to_document(&self) -> Result<XmlElement> {
        if self.transaction_count() == 0 {
            return Err(EbicsError::CreateRequest(
                "credit transfer order contains no transactions".into(),
            ));
        }

        let group_header = XmlElement::new("GrpHdr")
            .child(XmlElement::new("MsgId").text(hex::encode(crypto::random_nonce())))
            .child(
                XmlElement::new("CreDtTm")
                    .text(chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string()),
            )
            .child(XmlElement::new("NbOfTxs").text(self.transaction_count().to_string()))
            .child(XmlElement::new("InitgPty").child(XmlElement::new("Nm").text(&self.initiating_party)));

        let mut initiation = XmlElement::new("CstmrCdtTrfInitn").child(group_header);
        for info in &self.payment_infos {
            initiation.children.push(crate::xml::XmlNode::Element(payment_info(info)));
        }

        Ok(XmlElement::new("Document")
            .attr(ns::attr::XMLNS, ns::PAIN_001)
            .child(initiation))
    }
}

fn payment_info(info: &CctPaymentInfo) -> XmlElement {
    let mut el = XmlElement::new("PmtInf")
        .child(XmlElement::new("PmtInfId").text(&info.payment_info_id))
        .child(XmlElement::new("PmtMtd").text("TRF"))
        .child(XmlElement::new("NbOfTxs").text(info.transfers.len().to_string()))
        .child(
            XmlElement::new("ReqdExctnDt")
                .text(info.requested_execution_date.format("%Y-%m-%d").to_string()),
        )
        .child(XmlElement::new("Dbtr").child(XmlElement::new("Nm").text(&info.debtor_name)))
        .child(
            XmlElement::new("DbtrAcct")
                .child(XmlElement::new("Id").child(XmlElement::new("IBAN").text(&info.debtor_iban))),
        )
        .child(
            XmlElement::new("DbtrAgt")
                .child(XmlElement::new("FinInstnId").child(XmlElement::new("BIC").text(&info.debtor_bic))),
        );

    for transfer in &info.transfers {
        el.children
            .push(crate::xml::XmlNode::Element(transfer_info(transfer)));
    }
    el
}

fn transfer_info(transfer: &CreditTransfer) -> XmlElement {
    let mut el = XmlElement::new("CdtTrfTxInf")
        .child(
            XmlElement::new("PmtId")
                .child(XmlElement::new("EndToEndId").text(&transfer.end_to_end_id)),
        )
        .child(
            XmlElement::new("Amt").child(
                XmlElement::new("InstdAmt")
                    .attr("Ccy", &transfer.currency)
                    .text(&transfer.amount),
            ),
        );

    if let Some(bic) = &transfer.creditor_bic {
        el = el.child(
            XmlElement::new("CdtrAgt")
                .child(XmlElement::new("FinInstnId").child(XmlElement::new("BIC").text(bic))),
        );
    }

    el = el
        .child(XmlElement::new("Cdtr").child(XmlElement::new("Nm").text(&transfer.creditor_name)))
        .child(
            XmlElement::new("CdtrAcct").child(
                XmlElement::new("Id").child(XmlElement::new("IBAN").text(&transfer.creditor_iban)),
            ),
        );

    if let Some(remittance) = &transfer.remittance_info {
        el = el.child(XmlElement::new("RmtInf").child(XmlElement::new("Ustrd").text(remittance)));
    }
    el
}

pub struct Cct {
    pub params: CctParams,
}

impl Command for Cct {
    fn order_type(&self) -> &'static str {
        "CCT"
    }

    fn attribute(&self) -> OrderAttribute {
        OrderAttribute::Ozhnn
    }

    fn direction(&self) -> Direction {
        Direction::Upload
    }

    fn upload_payload(&self, _config: &EbicsConfig) -> Result<Vec<u8>> {
        Ok(self.params.to_document()?.to_document().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_params() -> CctParams {
        CctParams {
            initiating_party: "ACME GmbH".into(),
            payment_infos: vec![CctPaymentInfo {
                payment_info_id: "PMT-2024-001".into(),
                debtor_name: "ACME GmbH".into(),
                debtor_iban: "DE89370400440532013000".into(),
                debtor_bic: "COBADEFFXXX".into(),
                requested_execution_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
                transfers: vec![
                    CreditTransfer {
                        end_to_end_id: "E2E-1".into(),
                        amount: "1250.00".into(),
                        currency: "EUR".into(),
                        creditor_name: "Supplier AG".into(),
                        creditor_iban: "DE02120300000000202051".into(),
                        creditor_bic: Some("BYLADEM1001".into()),
                        remittance_info: Some("Invoice 4711".into()),
                    },
                    CreditTransfer {
                        end_to_end_id: "E2E-2".into(),
                        amount: "80.50".into(),
                        currency: "EUR".into(),
                        creditor_name: "Other Ltd".into(),
                        creditor_iban: "FR1420041010050500013M02606".into(),
                        creditor_bic: None,
                        remittance_info: None,
                    },
                ],
            }],
        }
    }

    #[test]
    fn test_pain001_document_shape() {
        let doc = sample_params().to_document().unwrap();

        assert_eq!(doc.get_attr("xmlns"), Some(ns::PAIN_001));
        assert_eq!(doc.find_text("NbOfTxs").unwrap(), "2");
        assert_eq!(doc.find_text("PmtMtd").unwrap(), "TRF");
        assert_eq!(doc.find_text("ReqdExctnDt").unwrap(), "2024-03-15");
        assert_eq!(doc.find_text("EndToEndId").unwrap(), "E2E-1");

        let amount = doc.find("InstdAmt").unwrap();
        assert_eq!(amount.get_attr("Ccy"), Some("EUR"));
        assert_eq!(amount.text_content(), "1250.00");

        // The second transfer omits agent and remittance.
        let transfers = doc.find_all("CdtTrfTxInf");
        assert_eq!(transfers.len(), 2);
        assert!(transfers[1].find("CdtrAgt").is_none());
        assert!(transfers[1].find("RmtInf").is_none());
    }

    #[test]
    fn test_empty_order_rejected() {
        let params = CctParams {
            initiating_party: "ACME GmbH".into(),
            payment_infos: vec![],
        };
        assert!(matches!(
            params.to_document(),
            Err(EbicsError::CreateRequest(_))
        ));
    }

    #[test]
    fn test_upload_payload_is_parseable_xml() {
        let payload = Cct { params: sample_params() }
            .upload_payload(&crate::orders::tests_support::dummy_config())
            .unwrap();
        let text = String::from_utf8(payload).unwrap();
        assert!(text.starts_with("<?xml"));
        XmlElement::parse(&text).unwrap();
    }
}
