//! XML namespace and name constants used across the library.

/// EBICS H004 schema namespace
pub const EBICS_H004: &str = "urn:org:ebics:H004";

/// EBICS H005 schema namespace
pub const EBICS_H005: &str = "urn:org:ebics:H005";

/// XML Digital Signature namespace
pub const DSIG: &str = "http://www.w3.org/2000/09/xmldsig#";

/// EBICS signature data (electronic signatures) namespace
pub const S001: &str = "http://www.ebics.org/S001";

/// ISO 20022 customer credit transfer initiation (pain.001)
pub const PAIN_001: &str = "urn:iso:std:iso:20022:tech:xsd:pain.001.001.03";

/// ISO 20022 customer direct debit initiation (pain.008)
pub const PAIN_008: &str = "urn:iso:std:iso:20022:tech:xsd:pain.008.001.02";

// ── Algorithm identifiers ────────────────────────────────────────────

/// Canonical XML 1.0 (inclusive)
pub const ALG_C14N: &str = "http://www.w3.org/TR/2001/REC-xml-c14n-20010315";

/// RSA PKCS#1 v1.5 with SHA-256
pub const ALG_RSA_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";

/// SHA-256 digest
pub const ALG_SHA256: &str = "http://www.w3.org/2001/04/xmlenc#sha256";

/// Reference URI selecting every element flagged for authentication
pub const AUTHENTICATED_REFERENCE: &str = "#xpointer(//*[@authenticate='true'])";

// ── Element and attribute names ──────────────────────────────────────

pub mod node {
    // DSig elements
    pub const AUTH_SIGNATURE: &str = "AuthSignature";
    pub const SIGNED_INFO: &str = "ds:SignedInfo";
    pub const CANONICALIZATION_METHOD: &str = "ds:CanonicalizationMethod";
    pub const SIGNATURE_METHOD: &str = "ds:SignatureMethod";
    pub const SIGNATURE_VALUE: &str = "ds:SignatureValue";
    pub const REFERENCE: &str = "ds:Reference";
    pub const TRANSFORMS: &str = "ds:Transforms";
    pub const TRANSFORM: &str = "ds:Transform";
    pub const DIGEST_METHOD: &str = "ds:DigestMethod";
    pub const DIGEST_VALUE: &str = "ds:DigestValue";

    // Request/response framing
    pub const EBICS_REQUEST: &str = "ebicsRequest";
    pub const EBICS_UNSECURED_REQUEST: &str = "ebicsUnsecuredRequest";
    pub const EBICS_NO_PUB_KEY_DIGESTS_REQUEST: &str = "ebicsNoPubKeyDigestsRequest";
    pub const EBICS_RESPONSE: &str = "ebicsResponse";
    pub const EBICS_KEY_MANAGEMENT_RESPONSE: &str = "ebicsKeyManagementResponse";
    pub const HEADER: &str = "header";
    pub const STATIC: &str = "static";
    pub const MUTABLE: &str = "mutable";
    pub const BODY: &str = "body";

    // Static header
    pub const HOST_ID: &str = "HostID";
    pub const NONCE: &str = "Nonce";
    pub const TIMESTAMP: &str = "Timestamp";
    pub const PARTNER_ID: &str = "PartnerID";
    pub const USER_ID: &str = "UserID";
    pub const ORDER_DETAILS: &str = "OrderDetails";
    pub const ORDER_TYPE: &str = "OrderType";
    pub const ORDER_ATTRIBUTE: &str = "OrderAttribute";
    pub const STANDARD_ORDER_PARAMS: &str = "StandardOrderParams";
    pub const DATE_RANGE: &str = "DateRange";
    pub const START: &str = "Start";
    pub const END: &str = "End";
    pub const BANK_PUB_KEY_DIGESTS: &str = "BankPubKeyDigests";
    pub const AUTHENTICATION: &str = "Authentication";
    pub const ENCRYPTION: &str = "Encryption";
    pub const SECURITY_MEDIUM: &str = "SecurityMedium";
    pub const NUM_SEGMENTS: &str = "NumSegments";
    pub const TRANSACTION_ID: &str = "TransactionID";

    // Mutable header
    pub const TRANSACTION_PHASE: &str = "TransactionPhase";
    pub const SEGMENT_NUMBER: &str = "SegmentNumber";
    pub const RETURN_CODE: &str = "ReturnCode";
    pub const REPORT_TEXT: &str = "ReportText";

    // Body
    pub const DATA_TRANSFER: &str = "DataTransfer";
    pub const DATA_ENCRYPTION_INFO: &str = "DataEncryptionInfo";
    pub const ENCRYPTION_PUB_KEY_DIGEST: &str = "EncryptionPubKeyDigest";
    pub const TRANSACTION_KEY: &str = "TransactionKey";
    pub const SIGNATURE_DATA: &str = "SignatureData";
    pub const ORDER_DATA: &str = "OrderData";
    pub const TRANSFER_RECEIPT: &str = "TransferReceipt";
    pub const RECEIPT_CODE: &str = "ReceiptCode";
    pub const TIMESTAMP_BANK_PARAMETER: &str = "TimestampBankParameter";

    // Key management order data
    pub const SIGNATURE_PUB_KEY_ORDER_DATA: &str = "SignaturePubKeyOrderData";
    pub const HIA_REQUEST_ORDER_DATA: &str = "HIARequestOrderData";
    pub const HPB_RESPONSE_ORDER_DATA: &str = "HPBResponseOrderData";
    pub const SIGNATURE_PUB_KEY_INFO: &str = "SignaturePubKeyInfo";
    pub const AUTHENTICATION_PUB_KEY_INFO: &str = "AuthenticationPubKeyInfo";
    pub const ENCRYPTION_PUB_KEY_INFO: &str = "EncryptionPubKeyInfo";
    pub const PUB_KEY_VALUE: &str = "PubKeyValue";
    pub const RSA_KEY_VALUE: &str = "ds:RSAKeyValue";
    pub const MODULUS: &str = "ds:Modulus";
    pub const EXPONENT: &str = "ds:Exponent";
    pub const SIGNATURE_VERSION: &str = "SignatureVersion";
    pub const AUTHENTICATION_VERSION: &str = "AuthenticationVersion";
    pub const ENCRYPTION_VERSION: &str = "EncryptionVersion";

    // User electronic signature
    pub const USER_SIGNATURE_DATA: &str = "UserSignatureData";
    pub const ORDER_SIGNATURE_DATA: &str = "OrderSignatureData";

    // HPD order data
    pub const HPD_RESPONSE_ORDER_DATA: &str = "HPDResponseOrderData";
    pub const ACCESS_PARAMS: &str = "AccessParams";
    pub const PROTOCOL_PARAMS: &str = "ProtocolParams";
}

pub mod attr {
    pub const AUTHENTICATE: &str = "authenticate";
    pub const LAST_SEGMENT: &str = "lastSegment";
    pub const ALGORITHM: &str = "Algorithm";
    pub const URI: &str = "URI";
    pub const VERSION: &str = "Version";
    pub const REVISION: &str = "Revision";
    pub const XMLNS: &str = "xmlns";
    pub const XMLNS_DS: &str = "xmlns:ds";
}
