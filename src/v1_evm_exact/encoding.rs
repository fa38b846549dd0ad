//! Transport encoding of payment payloads.
//!
//! A [`PaymentPayload`] travels as a single opaque string, placed in an HTTP
//! header or query parameter. The format is:
//!
//! 1. Compact UTF-8 JSON of the payload, no insignificant whitespace.
//!    Envelope fields appear in the order `version`, `scheme`, `namespace`,
//!    `networkId`, `resource`, `payload`. Inside `payload`, `type` comes first,
//!    followed by the variant's fields in declaration order.
//!    Optional fields that are absent are omitted, never written as `null`.
//! 2. Base64url (RFC 4648 §5) of those bytes, without `=` padding.
//!
//! Amounts and timestamps are decimal strings, hashes, nonces and signatures
//! are `0x`-prefixed hex, addresses are EIP-55 checksummed. Equal payloads
//! always produce identical strings.

use base64::Engine;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};

use crate::v1_evm_exact::types::PaymentPayload;

/// Encodes `payload` into its transport string.
///
/// Serialization of a well-formed payload cannot fail; the `Result` only
/// reflects the `serde_json` signature.
pub fn encode_payment_payload(payload: &PaymentPayload) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(payload)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Reference decoder for [`encode_payment_payload`].
///
/// Accepts padded and unpadded base64url input.
pub fn decode_payment_payload(encoded: &str) -> Result<PaymentPayload, DecodeError> {
    let trimmed = encoded.trim();
    let bytes = if trimmed.ends_with('=') {
        URL_SAFE.decode(trimmed)?
    } else {
        URL_SAFE_NO_PAD.decode(trimmed)?
    };
    Ok(serde_json::from_slice(&bytes)?)
}

/// Errors returned by [`decode_payment_payload`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Invalid base64url: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Invalid payload JSON: {0}")]
    Json(#[from] serde_json::Error),
}
