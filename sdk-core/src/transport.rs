//! HTTP transport seam.
//!
//! The engine talks to the bank through the [`Transport`] trait so tests
//! can script the bank side; [`HttpTransport`] is the production
//! implementation over a pooled reqwest client.

use crate::config::EbicsConfig;
use crate::error::{EbicsError, Result};
use reqwest::header::CONTENT_TYPE;

const EBICS_CONTENT_TYPE: &str = "text/xml; charset=UTF-8";

/// One request/response exchange with the bank
pub trait Transport: Send + Sync {
    /// POST a complete EBICS document and return the response document.
    fn exchange(&self, body: String) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// HTTPS POST transport. The underlying client pools connections and is
/// shared across transactions for the lifetime of the
/// [`crate::client::EbicsClient`].
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    pub fn new(config: &EbicsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .danger_accept_invalid_certs(config.insecure_tls)
            .build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

impl Transport for HttpTransport {
    async fn exchange(&self, body: String) -> Result<String> {
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, EBICS_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EbicsError::Transport(format!(
                "bank endpoint returned HTTP {status}"
            )));
        }
        Ok(response.text().await?)
    }
}
