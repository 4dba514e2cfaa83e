//! HPD: download the bank parameters.

use super::{Command, OrderAttribute, OrderResult};
use crate::error::{EbicsError, Result};
use crate::transaction::Direction;
use crate::xml::XmlElement;
use serde::Serialize;

/// Access side of the bank parameters
#[derive(Debug, Clone, Default, Serialize)]
pub struct AccessParams {
    pub url: String,
    pub institute: String,
    pub host_id: String,
}

/// Protocol side of the bank parameters
#[derive(Debug, Clone, Serialize)]
pub struct ProtocolParams {
    /// Schema generations the bank speaks, e.g. `["H004", "H005"]`
    pub protocols: Vec<String>,
    pub recovery_supported: bool,
    pub prevalidation_supported: bool,
    pub x509_data_persistent: bool,
    pub client_data_download_supported: bool,
    pub downloadable_order_data_supported: bool,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        // Schema defaults: capabilities are opt-out, X.509 persistence is
        // opt-in.
        Self {
            protocols: Vec::new(),
            recovery_supported: true,
            prevalidation_supported: true,
            x509_data_persistent: false,
            client_data_download_supported: true,
            downloadable_order_data_supported: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BankParams {
    pub access: AccessParams,
    pub protocol: ProtocolParams,
}

pub struct Hpd;

impl Command for Hpd {
    fn order_type(&self) -> &'static str {
        "HPD"
    }

    fn attribute(&self) -> OrderAttribute {
        OrderAttribute::Dzhnn
    }

    fn direction(&self) -> Direction {
        Direction::Download
    }

    fn parse_order_data(&self, data: &[u8]) -> Result<OrderResult> {
        let text = std::str::from_utf8(data)
            .map_err(|_| EbicsError::Deserialization("HPD order data is not UTF-8".into()))?;
        let doc = XmlElement::parse(text)
            .map_err(|e| EbicsError::Deserialization(format!("HPD order data: {e}")))?;
        if doc.local_name() != "HPDResponseOrderData" {
            return Err(EbicsError::Deserialization(format!(
                "expected HPDResponseOrderData, got <{}>",
                doc.name
            )));
        }

        let mut params = BankParams::default();

        if let Some(access) = doc.find("AccessParams") {
            params.access.url = access.find_text("URL").unwrap_or_default();
            params.access.institute = access.find_text("Institute").unwrap_or_default();
            params.access.host_id = access.find_text("HostID").unwrap_or_default();
        }

        if let Some(protocol) = doc.find("ProtocolParams") {
            if let Some(version) = protocol.find("Version") {
                params.protocol.protocols = version
                    .find_all("Protocol")
                    .iter()
                    .map(|p| p.text_content().trim().to_string())
                    .collect();
            }
            params.protocol.recovery_supported =
                flag(protocol, "Recovery", "supported", true);
            params.protocol.prevalidation_supported =
                flag(protocol, "PreValidation", "supported", true);
            params.protocol.x509_data_persistent =
                flag(protocol, "X509Data", "persistent", false);
            params.protocol.client_data_download_supported =
                flag(protocol, "ClientDataDownload", "supported", true);
            params.protocol.downloadable_order_data_supported =
                flag(protocol, "DownloadableOrderData", "supported", true);
        }

        Ok(OrderResult::BankParams(params))
    }
}

fn flag(parent: &XmlElement, element: &str, attribute: &str, default: bool) -> bool {
    match parent.find(element).and_then(|e| e.get_attr(attribute)) {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HPD_DATA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<HPDResponseOrderData xmlns="urn:org:ebics:H004">
  <AccessParams>
    <URL>https://ebics.testbank.example/ebicsweb</URL>
    <Institute>Test Bank AG</Institute>
    <HostID>HOST01</HostID>
  </AccessParams>
  <ProtocolParams>
    <Version>
      <Protocol>H004</Protocol>
      <Protocol>H005</Protocol>
    </Version>
    <Recovery supported="true"/>
    <PreValidation supported="false"/>
    <X509Data persistent="false"/>
    <ClientDataDownload supported="true"/>
    <DownloadableOrderData supported="true"/>
  </ProtocolParams>
</HPDResponseOrderData>"#;

    #[test]
    fn test_parse_bank_parameters() {
        let parsed = Hpd.parse_order_data(HPD_DATA.as_bytes()).unwrap();
        let OrderResult::BankParams(params) = parsed else {
            panic!("expected bank params");
        };

        assert_eq!(params.access.institute, "Test Bank AG");
        assert_eq!(params.access.url, "https://ebics.testbank.example/ebicsweb");
        assert_eq!(params.protocol.protocols, ["H004", "H005"]);
        assert!(params.protocol.recovery_supported);
        assert!(!params.protocol.prevalidation_supported);
        assert!(!params.protocol.x509_data_persistent);
        assert!(params.protocol.client_data_download_supported);
    }

    #[test]
    fn test_absent_flags_use_schema_defaults() {
        let data = r#"<HPDResponseOrderData xmlns="urn:org:ebics:H004"><ProtocolParams><Version><Protocol>H004</Protocol></Version></ProtocolParams></HPDResponseOrderData>"#;
        let OrderResult::BankParams(params) = Hpd.parse_order_data(data.as_bytes()).unwrap() else {
            panic!("expected bank params");
        };
        assert!(params.protocol.recovery_supported);
        assert!(!params.protocol.x509_data_persistent);
        assert_eq!(params.protocol.protocols, ["H004"]);
    }
}
