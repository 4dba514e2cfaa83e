//! The transaction engine.
//!
//! Drives the Initialisation/Transfer/Receipt dialog of §4 of the EBICS
//! specification: strictly sequential request/response pairs, segments
//! numbered from 1, a `TransactionID` correlating everything after the
//! initialisation response. Every outbound document except the unsecured
//! key management requests is signed; every authenticated response must
//! verify against the bank authentication key.
//!
//! Cancellation is dropping the returned future. Cancelling an upload
//! after a successful initialisation leaves an open transaction on the
//! bank side which may need operator cleanup.

use crate::config::{BankKeys, EbicsConfig};
use crate::envelope;
use crate::error::{EbicsError, Result};
use crate::orders::{Command, OrderResult};
use crate::request::UploadInitData;
use crate::response::{ResponseDocument, ReturnCodes};
use crate::transaction::{Direction, Phase, TransactionContext};
use crate::transport::Transport;
use crate::xml::{dsig, XmlElement};
use tracing::{debug, warn};

/// Outcome of a download transaction
pub struct DownloadOutcome {
    pub codes: ReturnCodes,
    pub order_data: OrderResult,
}

/// Outcome of an upload transaction
pub struct UploadOutcome {
    pub codes: ReturnCodes,
    pub transaction_id: Option<String>,
}

/// Drives EBICS transactions over a [`Transport`]. Short-lived: borrow the
/// configuration and a bank-key snapshot, run one or more transactions,
/// drop it.
pub struct ProtocolEngine<'a, T: Transport> {
    config: &'a EbicsConfig,
    bank: Option<&'a BankKeys>,
    transport: &'a T,
}

impl<'a, T: Transport> ProtocolEngine<'a, T> {
    pub fn new(config: &'a EbicsConfig, bank: Option<&'a BankKeys>, transport: &'a T) -> Self {
        Self {
            config,
            bank,
            transport,
        }
    }

    fn bank(&self) -> Result<&'a BankKeys> {
        self.bank.ok_or_else(|| {
            EbicsError::Configuration("bank keys not loaded; run HPB first".into())
        })
    }

    /// Sign, serialize and send a document; parse the response.
    async fn exchange_signed(&self, mut doc: XmlElement) -> Result<ResponseDocument> {
        dsig::sign(&mut doc, self.config.auth_key.private())?;
        let body = doc.to_document();
        let response = self.transport.exchange(body).await?;
        let parsed = ResponseDocument::parse(&response)?;
        self.check_response(&parsed)?;
        Ok(parsed)
    }

    /// Authenticated responses must verify against the bank X002 key; a
    /// broken signature is fatal for the transaction.
    fn check_response(&self, response: &ResponseDocument) -> Result<()> {
        if let Some(bank) = self.bank {
            if !response.verify_signature(&bank.auth.key) {
                return Err(EbicsError::Protocol(
                    "response authentication signature did not verify".into(),
                ));
            }
        } else {
            debug!("bank keys unknown, skipping response signature verification");
        }
        if response.codes.is_recovery_sync() {
            warn!(
                code = response.codes.technical_code,
                "bank signalled recovery synchronisation; not retrying"
            );
        }
        Ok(())
    }

    /// Key management without security context: INI and HIA.
    pub async fn send_unsecured(&self, command: &dyn Command) -> Result<ReturnCodes> {
        let doc = command.build_init_request(self.config, None, None)?;
        debug!(order = command.order_type(), "sending unsecured request");
        let response = self.transport.exchange(doc.to_document()).await?;
        let parsed = ResponseDocument::parse(&response)?;
        Ok(parsed.codes)
    }

    /// HPB: one signed request/response pair outside the transaction state
    /// machine; the order data is encrypted but not segmented.
    pub async fn fetch_bank_keys(&self, command: &dyn Command) -> Result<DownloadOutcome> {
        let doc = command.build_init_request(self.config, self.bank, None)?;
        debug!(order = command.order_type(), "fetching bank keys");
        let response = self.exchange_signed(doc).await?;

        if !response.codes.technical_is_informational() || response.codes.business_code != 0 {
            return Ok(DownloadOutcome {
                codes: response.codes,
                order_data: OrderResult::None,
            });
        }

        let wrapped_key = response.transaction_key.as_deref().ok_or_else(|| {
            EbicsError::Protocol("key management response lacks a TransactionKey".into())
        })?;
        let segment = response
            .order_data
            .clone()
            .ok_or_else(|| EbicsError::Protocol("key management response lacks OrderData".into()))?;

        let payload = envelope::open(&[segment], wrapped_key, self.config.crypt_key.private())?;
        let order_data = command.parse_order_data(&payload)?;
        Ok(DownloadOutcome {
            codes: response.codes,
            order_data,
        })
    }

    /// Run a download transaction: Initialisation, Transfer until the last
    /// segment, Receipt.
    pub async fn download(&self, command: &dyn Command) -> Result<DownloadOutcome> {
        debug_assert_eq!(command.direction(), Direction::Download);
        let bank = self.bank()?;
        let mut ctx = TransactionContext::download();

        let init = command.build_init_request(self.config, Some(bank), None)?;
        debug!(order = command.order_type(), phase = "Initialisation", "download start");
        let response = self.exchange_signed(init).await?;

        if !response.codes.technical_is_informational() || response.codes.business_code != 0 {
            return Ok(DownloadOutcome {
                codes: response.codes,
                order_data: OrderResult::None,
            });
        }

        let transaction_id = response.transaction_id.clone().ok_or_else(|| {
            EbicsError::Protocol("initialisation response lacks a TransactionID".into())
        })?;
        ctx.adopt_transaction_id(&transaction_id)?;
        ctx.num_segments = response.num_segments.unwrap_or(1);

        let wrapped_key = response
            .transaction_key
            .clone()
            .ok_or_else(|| EbicsError::Protocol("download response lacks a TransactionKey".into()))?;
        let first_segment = response
            .order_data
            .clone()
            .ok_or_else(|| EbicsError::Protocol("download response lacks OrderData".into()))?;
        ctx.segments.push(first_segment);
        ctx.segment_number = 1;
        ctx.last_segment = response.last_segment || ctx.num_segments == 1;

        // Transfer phase: request the remaining segments in order.
        while ctx.segments.len() < ctx.num_segments {
            ctx.phase = Phase::Transfer;
            let number = ctx.segments.len() + 1;
            let doc = command.build_transfer_request(
                self.config,
                ctx.require_transaction_id()?,
                number,
                number == ctx.num_segments,
                None,
            );
            debug!(order = command.order_type(), segment = number, "requesting segment");
            let response = self.exchange_signed(doc).await?;

            if !response.codes.technical_is_informational() {
                return Ok(DownloadOutcome {
                    codes: response.codes,
                    order_data: OrderResult::None,
                });
            }
            if let Some(id) = &response.transaction_id {
                ctx.adopt_transaction_id(id)?;
            }
            if let Some(received) = response.segment_number {
                if received != number {
                    return Err(EbicsError::Protocol(format!(
                        "bank answered segment {received}, expected {number}"
                    )));
                }
            }
            let segment = response.order_data.clone().ok_or_else(|| {
                EbicsError::Protocol(format!("transfer response {number} lacks OrderData"))
            })?;
            ctx.segments.push(segment);
            ctx.segment_number = number;
            ctx.last_segment = number == ctx.num_segments;
        }

        // Decode before the receipt so a failure can be reported in it.
        let decoded = envelope::open(&ctx.segments, &wrapped_key, self.config.crypt_key.private());

        ctx.phase = Phase::Receipt;
        let receipt_code = if decoded.is_ok() { 0 } else { 1 };
        let receipt =
            command.build_receipt_request(self.config, ctx.require_transaction_id()?, receipt_code);
        debug!(order = command.order_type(), receipt_code, "sending receipt");
        let receipt_response = self.exchange_signed(receipt).await?;
        if !receipt_response.codes.technical_is_informational() {
            warn!(
                code = receipt_response.codes.technical_code,
                text = %receipt_response.codes.report_text,
                "receipt was not accepted"
            );
        }

        let payload = decoded?;
        let order_data = command.parse_order_data(&payload)?;
        Ok(DownloadOutcome {
            codes: receipt_response.codes,
            order_data,
        })
    }

    /// Run an upload transaction: Initialisation with the first segment,
    /// then Transfer for the rest. No Receipt phase.
    pub async fn upload(&self, command: &dyn Command) -> Result<UploadOutcome> {
        debug_assert_eq!(command.direction(), Direction::Upload);
        let bank = self.bank()?;

        let payload = command.upload_payload(self.config)?;
        let sealed = envelope::seal(&payload, &bank.crypt)?;
        let signature_data =
            envelope::user_signature_data(&payload, self.config, &sealed.transaction_key)?;
        let mut ctx = TransactionContext::upload(sealed.segments, sealed.transaction_key);

        let upload_data = UploadInitData {
            num_segments: ctx.num_segments,
            key_digest: &sealed.key_digest,
            wrapped_key: &sealed.wrapped_key,
            signature_data: &signature_data,
            first_segment: &ctx.segments[0],
        };
        let init =
            command.build_init_request(self.config, Some(bank), Some(&upload_data))?;
        ctx.next_segment()?;
        debug!(
            order = command.order_type(),
            segments = ctx.num_segments,
            "upload start"
        );
        let mut last_response = self.exchange_signed(init).await?;

        if !last_response.codes.technical_is_informational() {
            return Ok(UploadOutcome {
                codes: last_response.codes,
                transaction_id: last_response.transaction_id,
            });
        }
        let transaction_id = last_response.transaction_id.clone().ok_or_else(|| {
            EbicsError::Protocol("initialisation response lacks a TransactionID".into())
        })?;
        ctx.adopt_transaction_id(&transaction_id)?;

        while !ctx.last_segment {
            ctx.phase = Phase::Transfer;
            let number = ctx.next_segment()?;
            let doc = command.build_transfer_request(
                self.config,
                ctx.require_transaction_id()?,
                number,
                ctx.last_segment,
                Some(&ctx.segments[number - 1]),
            );
            debug!(order = command.order_type(), segment = number, "sending segment");
            last_response = self.exchange_signed(doc).await?;

            if !last_response.codes.technical_is_informational() {
                return Ok(UploadOutcome {
                    codes: last_response.codes,
                    transaction_id: Some(transaction_id),
                });
            }
            if let Some(id) = &last_response.transaction_id {
                ctx.adopt_transaction_id(id)?;
            }
        }

        Ok(UploadOutcome {
            codes: last_response.codes,
            transaction_id: Some(transaction_id),
        })
    }
}
