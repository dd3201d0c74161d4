//! Base64 payment header encoding.
//!
//! Payment payloads travel between client and facilitator as a base64
//! encoding of their JSON serialization, suitable for an HTTP header or a
//! JSON string field.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as b64;

use crate::error::ProtocolError;
use crate::proto::PaymentPayload;

/// Encodes a payment payload as a base64 payment header.
///
/// # Errors
///
/// Returns an error if the payload fails to serialize as JSON.
pub fn encode_payment_header<T: serde::Serialize>(
    payload: &PaymentPayload<T>,
) -> Result<String, ProtocolError> {
    let json = serde_json::to_vec(payload)?;
    Ok(b64.encode(json))
}

/// Decodes a base64 payment header into a payment payload envelope.
///
/// The scheme-specific body is left as raw JSON for the selected handler
/// to decode.
///
/// # Errors
///
/// Returns an error if the header is not valid base64 or the decoded bytes
/// are not a valid payment payload.
pub fn decode_payment_header(header: &str) -> Result<PaymentPayload, ProtocolError> {
    let bytes = b64.decode(header.trim())?;
    Ok(serde_json::from_slice(&bytes)?)
}
