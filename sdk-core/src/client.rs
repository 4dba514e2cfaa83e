//! The client façade: one method per order type.

use crate::config::{BankKeys, EbicsConfig};
use crate::engine::ProtocolEngine;
use crate::error::{EbicsError, Result};
use crate::orders::{
    cct::Cct, cdd::Cdd, hia::Hia, hpb::Hpb, hpd::Hpd, ini::Ini, ptk::Ptk, spr::Spr, sta::Sta,
    BankParams, CctParams, CddParams, DateRange, OrderResult,
};
use crate::response::ReturnCodes;
use crate::transport::{HttpTransport, Transport};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;

/// Result of a key management order (INI, HIA, SPR)
#[derive(Debug, Serialize)]
pub struct KeyManagementResponse {
    pub codes: ReturnCodes,
}

/// Result of HPB; on success the keys are also stored on the client.
pub struct HpbResponse {
    pub codes: ReturnCodes,
    /// `None` when the bank rejected the order; the return codes say why.
    pub bank_keys: Option<BankKeys>,
}

/// Result of HPD
#[derive(Debug, Serialize)]
pub struct HpdResponse {
    pub codes: ReturnCodes,
    pub params: BankParams,
}

/// Result of a textual download order (STA, PTK)
#[derive(Debug, Serialize)]
pub struct TextOrderResponse {
    pub codes: ReturnCodes,
    pub content: String,
}

/// Result of an upload order (CCT, CDD, SPR)
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub codes: ReturnCodes,
    pub transaction_id: Option<String>,
}

/// A configured EBICS client. Stateless apart from the bank keys, which
/// are written once by [`EbicsClient::hpb`] and read by every
/// authenticated order; concurrent transactions each own their context.
pub struct EbicsClient<T: Transport = HttpTransport> {
    config: EbicsConfig,
    bank: RwLock<Option<BankKeys>>,
    transport: T,
}

impl EbicsClient<HttpTransport> {
    /// Build a client over HTTPS from validated configuration.
    pub fn connect(config: EbicsConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> EbicsClient<T> {
    /// Build a client over a caller-supplied transport.
    pub fn with_transport(config: EbicsConfig, transport: T) -> Result<Self> {
        config.validate()?;
        let bank = RwLock::new(config.bank_keys.clone());
        Ok(Self {
            config,
            bank,
            transport,
        })
    }

    pub fn config(&self) -> &EbicsConfig {
        &self.config
    }

    /// The bank keys currently in effect, if any.
    pub async fn bank_keys(&self) -> Option<BankKeys> {
        self.bank.read().await.clone()
    }

    /// INI: announce the electronic signature key.
    pub async fn ini(&self) -> Result<KeyManagementResponse> {
        let codes = self
            .engine_with(None)
            .send_unsecured(&Ini)
            .await?;
        Ok(KeyManagementResponse { codes })
    }

    /// HIA: announce the authentication and encryption keys.
    pub async fn hia(&self) -> Result<KeyManagementResponse> {
        let codes = self
            .engine_with(None)
            .send_unsecured(&Hia)
            .await?;
        Ok(KeyManagementResponse { codes })
    }

    /// HPB: fetch the bank keys and store them for subsequent orders.
    pub async fn hpb(&self) -> Result<HpbResponse> {
        let snapshot = self.bank_keys().await;
        let outcome = self
            .engine_with(snapshot.as_ref())
            .fetch_bank_keys(&Hpb)
            .await?;

        let bank_keys = match outcome.order_data {
            OrderResult::BankKeys(keys) => {
                info!(host = %self.config.host_id, "bank keys updated from HPB");
                *self.bank.write().await = Some(keys.clone());
                Some(keys)
            }
            _ => None,
        };
        Ok(HpbResponse {
            codes: outcome.codes,
            bank_keys,
        })
    }

    /// HPD: download the bank parameters.
    pub async fn hpd(&self) -> Result<HpdResponse> {
        let snapshot = self.require_bank_keys().await?;
        let outcome = self.engine_with(Some(&snapshot)).download(&Hpd).await?;
        let params = match outcome.order_data {
            OrderResult::BankParams(params) => params,
            _ => BankParams::default(),
        };
        Ok(HpdResponse {
            codes: outcome.codes,
            params,
        })
    }

    /// STA: download account statements (MT940).
    pub async fn sta(&self, date_range: Option<DateRange>) -> Result<TextOrderResponse> {
        self.download_text(&Sta { date_range }).await
    }

    /// PTK: download the customer protocol log.
    pub async fn ptk(&self, date_range: Option<DateRange>) -> Result<TextOrderResponse> {
        self.download_text(&Ptk { date_range }).await
    }

    /// CCT: upload a SEPA credit transfer.
    pub async fn cct(&self, params: CctParams) -> Result<UploadResponse> {
        self.upload(&Cct { params }).await
    }

    /// CDD: upload a SEPA direct debit.
    pub async fn cdd(&self, params: CddParams) -> Result<UploadResponse> {
        self.upload(&Cdd { params }).await
    }

    /// SPR: suspend this user's access.
    pub async fn spr(&self) -> Result<UploadResponse> {
        self.upload(&Spr).await
    }

    async fn download_text(&self, command: &dyn crate::orders::Command) -> Result<TextOrderResponse> {
        let snapshot = self.require_bank_keys().await?;
        let outcome = self.engine_with(Some(&snapshot)).download(command).await?;
        let content = match outcome.order_data {
            OrderResult::Text(text) => text,
            _ => String::new(),
        };
        Ok(TextOrderResponse {
            codes: outcome.codes,
            content,
        })
    }

    async fn upload(&self, command: &dyn crate::orders::Command) -> Result<UploadResponse> {
        let snapshot = self.require_bank_keys().await?;
        let outcome = self.engine_with(Some(&snapshot)).upload(command).await?;
        Ok(UploadResponse {
            codes: outcome.codes,
            transaction_id: outcome.transaction_id,
        })
    }

    async fn require_bank_keys(&self) -> Result<BankKeys> {
        self.bank_keys().await.ok_or_else(|| {
            EbicsError::Configuration("bank keys not loaded; run HPB first".into())
        })
    }

    fn engine_with<'a>(&'a self, bank: Option<&'a BankKeys>) -> ProtocolEngine<'a, T> {
        ProtocolEngine::new(&self.config, bank, &self.transport)
    }
}
