//! Inbound EBICS documents: `ebicsResponse` and
//! `ebicsKeyManagementResponse`.

use crate::error::{EbicsError, Result};
use crate::xml::{dsig, XmlElement};
use rsa::RsaPublicKey;
use serde::Serialize;

/// `EBICS_DOWNLOAD_POSTPROCESS_DONE`
pub const DOWNLOAD_POSTPROCESS_DONE: i32 = 11_000;
/// `EBICS_DOWNLOAD_POSTPROCESS_SKIPPED`
pub const DOWNLOAD_POSTPROCESS_SKIPPED: i32 = 11_001;
/// `EBICS_TX_RECOVERY_SYNC`
pub const RECOVERY_SYNC: i32 = 61_101;

/// Bank-reported outcome of a request. Non-zero codes are data for the
/// caller, not errors.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReturnCodes {
    pub technical_code: i32,
    pub business_code: i32,
    pub report_text: String,
}

impl ReturnCodes {
    /// True when the bank accepted the request outright.
    pub fn is_success(&self) -> bool {
        self.technical_code == 0 && self.business_code == 0
    }

    /// True when the technical code only carries information (download
    /// post-processing notes, recovery synchronisation) rather than a
    /// rejection.
    pub fn technical_is_informational(&self) -> bool {
        matches!(
            self.technical_code,
            0 | DOWNLOAD_POSTPROCESS_DONE | DOWNLOAD_POSTPROCESS_SKIPPED | RECOVERY_SYNC
        )
    }

    /// True when the bank signalled a recovery synchronisation point.
    pub fn is_recovery_sync(&self) -> bool {
        self.technical_code == RECOVERY_SYNC
    }
}

/// A parsed response document. The original tree is retained for signature
/// verification.
pub struct ResponseDocument {
    pub codes: ReturnCodes,
    pub transaction_id: Option<String>,
    pub num_segments: Option<usize>,
    pub phase: Option<String>,
    pub segment_number: Option<usize>,
    pub last_segment: bool,
    /// Base64 `DataEncryptionInfo/TransactionKey`, downloads only
    pub transaction_key: Option<String>,
    /// Base64 `OrderData` carried by this document
    pub order_data: Option<String>,
    doc: XmlElement,
}

impl ResponseDocument {
    pub fn parse(xml: &str) -> Result<Self> {
        let doc = XmlElement::parse(xml)?;
        if !matches!(
            doc.local_name(),
            "ebicsResponse" | "ebicsKeyManagementResponse"
        ) {
            return Err(EbicsError::Protocol(format!(
                "unexpected response document <{}>",
                doc.name
            )));
        }

        let header = doc
            .find("header")
            .ok_or_else(|| EbicsError::Protocol("response has no header".into()))?;
        let technical_code = header
            .find_text("ReturnCode")
            .ok_or_else(|| EbicsError::Protocol("response has no technical ReturnCode".into()))
            .and_then(|t| parse_code(&t))?;
        let report_text = header.find_text("ReportText").unwrap_or_default();

        let body = doc
            .find("body")
            .ok_or_else(|| EbicsError::Protocol("response has no body".into()))?;
        let business_code = match body.find_text("ReturnCode") {
            Some(t) => parse_code(&t)?,
            None => 0,
        };

        let num_segments = match header.find_text("NumSegments") {
            Some(t) => Some(parse_count(&t, "NumSegments")?),
            None => None,
        };
        let (segment_number, last_segment) = match header.find("SegmentNumber") {
            Some(el) => (
                Some(parse_count(&el.text_content(), "SegmentNumber")?),
                el.get_attr("lastSegment") == Some("true"),
            ),
            None => (None, false),
        };

        Ok(Self {
            codes: ReturnCodes {
                technical_code,
                business_code,
                report_text: report_text.trim().to_string(),
            },
            transaction_id: header.find_text("TransactionID").map(|t| t.trim().to_string()),
            num_segments,
            phase: header.find_text("TransactionPhase"),
            segment_number,
            last_segment,
            transaction_key: body
                .find("DataEncryptionInfo")
                .and_then(|dei| dei.find_text("TransactionKey")),
            order_data: body.find_text("OrderData"),
            doc,
        })
    }

    /// Verify the embedded `AuthSignature` against the bank authentication
    /// key.
    pub fn verify_signature(&self, bank_auth: &RsaPublicKey) -> bool {
        dsig::verify(&self.doc, bank_auth)
    }

    pub fn document(&self) -> &XmlElement {
        &self.doc
    }
}

fn parse_code(text: &str) -> Result<i32> {
    text.trim()
        .parse()
        .map_err(|_| EbicsError::Protocol(format!("unparseable ReturnCode {text:?}")))
}

fn parse_count(text: &str, what: &str) -> Result<usize> {
    text.trim()
        .parse()
        .map_err(|_| EbicsError::Protocol(format!("unparseable {what} {text:?}")))
}
