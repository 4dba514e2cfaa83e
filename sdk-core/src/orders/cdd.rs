//! CDD: upload a SEPA core direct debit (pain.008.001.02).

use super::{Command, OrderAttribute};
use crate::config::EbicsConfig;
use crate::crypto;
use crate::error::{EbicsError, Result};
use crate::transaction::Direction;
use crate::xml::{ns, XmlElement};
use chrono::NaiveDate;
use serde::Serialize;

/// SEPA mandate sequence type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SequenceType {
    First,
    Recurring,
    OneOff,
    Final,
}

impl SequenceType {
    fn as_str(&self) -> &'static str {
        match self {
            SequenceType::First => "FRST",
            SequenceType::Recurring => "RCUR",
            SequenceType::OneOff => "OOFF",
            SequenceType::Final => "FNAL",
        }
    }
}

/// One direct debit instruction
#[derive(Debug, Clone, Serialize)]
pub struct DirectDebit {
    pub end_to_end_id: String,
    /// Decimal amount as a string, e.g. `"42.80"`
    pub amount: String,
    pub currency: String,
    pub debtor_name: String,
    pub debtor_iban: String,
    pub debtor_bic: String,
    pub mandate_id: String,
    pub mandate_signature_date: NaiveDate,
    pub remittance_info: Option<String>,
}

/// A group of debits collected to one creditor account on one date
#[derive(Debug, Clone, Serialize)]
pub struct CddPaymentInfo {
    pub payment_info_id: String,
    pub creditor_name: String,
    pub creditor_iban: String,
    pub creditor_bic: String,
    /// SEPA creditor identifier (e.g. `DE98ZZZ09999999999`)
    pub creditor_id: String,
    pub sequence_type: SequenceType,
    pub requested_collection_date: NaiveDate,
    pub debits: Vec<DirectDebit>,
}

/// Parameters of a direct debit order
#[derive(Debug, Clone, Serialize)]
pub struct CddParams {
    pub initiating_party: String,
    pub payment_infos: Vec<CddPaymentInfo>,
}

impl CddParams {
    fn transaction_count(&self) -> usize {
        self.payment_infos.iter().map(|p| p.debits.len()).sum()
    }

    /// Emit the pain.008.001.02 document.
    pub fn to_document(&self) -> Result<XmlElement> {
        if self.transaction_count() == 0 {
            return Err(EbicsError::CreateRequest(
                "direct debit order contains no transactions".into(),
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

        let mut initiation = XmlElement::new("CstmrDrctDbtInitn").child(group_header);
        for info in &self.payment_infos {
            initiation.children.push(crate::xml::XmlNode::Element(payment_info(info)));
        }

        Ok(XmlElement::new("Document")
            .attr(ns::attr::XMLNS, ns::PAIN_008)
            .child(initiation))
    }
}

fn payment_info(info: &CddPaymentInfo) -> XmlElement {
    let mut el = XmlElement::new("PmtInf")
        .child(XmlElement::new("PmtInfId").text(&info.payment_info_id))
        .child(XmlElement::new("PmtMtd").text("DD"))
        .child(XmlElement::new("NbOfTxs").text(info.debits.len().to_string()))
        .child(
            XmlElement::new("PmtTpInf")
                .child(XmlElement::new("SvcLvl").child(XmlElement::new("Cd").text("SEPA")))
                .child(XmlElement::new("LclInstrm").child(XmlElement::new("Cd").text("CORE")))
                .child(XmlElement::new("SeqTp").text(info.sequence_type.as_str())),
        )
        .child(
            XmlElement::new("ReqdColltnDt")
                .text(info.requested_collection_date.format("%Y-%m-%d").to_string()),
        )
        .child(XmlElement::new("Cdtr").child(XmlElement::new("Nm").text(&info.creditor_name)))
        .child(
            XmlElement::new("CdtrAcct").child(
                XmlElement::new("Id").child(XmlElement::new("IBAN").text(&info.creditor_iban)),
            ),
        )
        .child(
            XmlElement::new("CdtrAgt").child(
                XmlElement::new("FinInstnId").child(XmlElement::new("BIC").text(&info.creditor_bic)),
            ),
        )
        .child(
            XmlElement::new("CdtrSchmeId").child(
                XmlElement::new("Id").child(
                    XmlElement::new("PrvtId").child(
                        XmlElement::new("Othr")
                            .child(XmlElement::new("Id").text(&info.creditor_id))
                            .child(
                                XmlElement::new("SchmeNm")
                                    .child(XmlElement::new("Prtry").text("SEPA")),
                            ),
                    ),
                ),
            ),
        );

    for debit in &info.debits {
        el.children.push(crate::xml::XmlNode::Element(debit_info(debit)));
    }
    el
}

fn debit_info(debit: &DirectDebit) -> XmlElement {
    let mut el = XmlElement::new("DrctDbtTxInf")
        .child(XmlElement::new("PmtId").child(XmlElement::new("EndToEndId").text(&debit.end_to_end_id)))
        .child(
            XmlElement::new("InstdAmt")
                .attr("Ccy", &debit.currency)
                .text(&debit.amount),
        )
        .child(
            XmlElement::new("DrctDbtTx").child(
                XmlElement::new("MndtRltdInf")
                    .child(XmlElement::new("MndtId").text(&debit.mandate_id))
                    .child(
                        XmlElement::new("DtOfSgntr")
                            .text(debit.mandate_signature_date.format("%Y-%m-%d").to_string()),
                    ),
            ),
        )
        .child(
            XmlElement::new("DbtrAgt")
                .child(XmlElement::new("FinInstnId").child(XmlElement::new("BIC").text(&debit.debtor_bic))),
        )
        .child(XmlElement::new("Dbtr").child(XmlElement::new("Nm").text(&debit.debtor_name)))
        .child(
            XmlElement::new("DbtrAcct")
                .child(XmlElement::new("Id").child(XmlElement::new("IBAN").text(&debit.debtor_iban))),
        );

    if let Some(remittance) = &debit.remittance_info {
        el = el.child(XmlElement::new("RmtInf").child(XmlElement::new("Ustrd").text(remittance)));
    }
    el
}

pub struct Cdd {
    pub params: CddParams,
}

impl Command for Cdd {
    fn order_type(&self) -> &'static str {
        "CDD"
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

    fn sample_params() -> CddParams {
        CddParams {
            initiating_party: "ACME GmbH".into(),
            payment_infos: vec![CddPaymentInfo {
                payment_info_id: "DD-2024-007".into(),
                creditor_name: "ACME GmbH".into(),
                creditor_iban: "DE89370400440532013000".into(),
                creditor_bic: "COBADEFFXXX".into(),
                creditor_id: "DE98ZZZ09999999999".into(),
                sequence_type: SequenceType::Recurring,
                requested_collection_date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
                debits: vec![DirectDebit {
                    end_to_end_id: "E2E-DD-1".into(),
                    amount: "42.80".into(),
                    currency: "EUR".into(),
                    debtor_name: "Customer".into(),
                    debtor_iban: "DE02120300000000202051".into(),
                    debtor_bic: "BYLADEM1001".into(),
                    mandate_id: "MANDATE-001".into(),
                    mandate_signature_date: NaiveDate::from_ymd_opt(2022, 6, 1).unwrap(),
                    remittance_info: Some("Membership fee".into()),
                }],
            }],
        }
    }

    #[test]
    fn test_pain008_document_shape() {
        let doc = sample_params().to_document().unwrap();

        assert_eq!(doc.get_attr("xmlns"), Some(ns::PAIN_008));
        assert_eq!(doc.find_text("PmtMtd").unwrap(), "DD");
        assert_eq!(doc.find_text("SeqTp").unwrap(), "RCUR");
        assert_eq!(doc.find_text("ReqdColltnDt").unwrap(), "2024-04-02");
        assert_eq!(doc.find_text("MndtId").unwrap(), "MANDATE-001");
        assert_eq!(doc.find_text("DtOfSgntr").unwrap(), "2022-06-01");

        let scheme = doc.find("CdtrSchmeId").unwrap();
        assert_eq!(scheme.find_text("Id").unwrap(), "DE98ZZZ09999999999");
    }

    #[test]
    fn test_empty_order_rejected() {
        let params = CddParams {
            initiating_party: "ACME GmbH".into(),
            payment_infos: vec![],
        };
        assert!(params.to_document().is_err());
    }
}
