//! Wire format types for the x402 payment protocol.
//!
//! These types mirror the JSON shapes exchanged between resource servers,
//! clients, and facilitators:
//!
//! - [`PaymentRequirements`] - Payment terms published by the seller
//! - [`PaymentPayload`] - Proof of payment submitted by the buyer
//! - [`SettleRequest`] / [`SettleResponse`] - Facilitator settlement messages
//! - [`PaymentRequired`] - HTTP 402 response body
//! - [`SupportedKind`] / [`SupportedResponse`] - Capability discovery
//!
//! All types use camelCase field names on the wire.

use serde::{Deserialize, Serialize};

mod version;

pub use version::Version;

/// Version marker for x402 protocol version 1.
///
/// Serializes as the integer `1` and rejects other values on
/// deserialization.
pub type X402Version1 = Version<1>;

/// Convenience constant for constructing V1 protocol messages.
pub const V1: X402Version1 = Version;

/// Payment terms published by the seller.
///
/// Defines the conditions under which a payment will be accepted: the
/// scheme, network, amount, recipient, asset, and timing constraints.
/// Handlers may attach scheme-specific data in `extra` (for example a
/// settlement admin key and a recent blockhash).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    /// The payment scheme (e.g., "x-solana-settlement").
    pub scheme: String,
    /// The network name (e.g., "mainnet-beta").
    pub network: String,
    /// The maximum amount required, in the asset's base units, as a
    /// decimal string.
    pub max_amount_required: String,
    /// The resource URL being paid for.
    #[serde(default)]
    pub resource: String,
    /// Human-readable description of the resource.
    #[serde(default)]
    pub description: String,
    /// MIME type of the resource.
    #[serde(default)]
    pub mime_type: String,
    /// Optional JSON schema describing the resource output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<serde_json::Value>,
    /// The recipient address for payment.
    pub pay_to: String,
    /// Maximum time in seconds for payment validity.
    pub max_timeout_seconds: u64,
    /// The asset identifier (a token mint address, or "sol" for the
    /// native asset on Solana-style networks).
    pub asset: String,
    /// Scheme-specific extra data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

/// Proof of payment submitted by the buyer.
///
/// The `payload` body is scheme-specific and left opaque here; the handler
/// selected by `(scheme, network)` is responsible for decoding it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload<TPayload = Box<serde_json::value::RawValue>> {
    /// Protocol version (always 1).
    pub x402_version: X402Version1,
    /// The payment scheme.
    pub scheme: String,
    /// The network name.
    pub network: String,
    /// The scheme-specific payment proof.
    pub payload: TPayload,
}

impl<TPayload> PaymentPayload<TPayload> {
    /// Replaces the opaque payload with a decoded one, keeping the envelope.
    pub fn with_payload<T>(&self, payload: T) -> PaymentPayload<T> {
        PaymentPayload {
            x402_version: self.x402_version,
            scheme: self.scheme.clone(),
            network: self.network.clone(),
            payload,
        }
    }
}

/// Request to settle a payment.
///
/// The `payment_header` is a base64-encoded JSON [`PaymentPayload`]; see
/// [`crate::encoding::decode_payment_header`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleRequest {
    /// Base64-encoded JSON payment payload.
    pub payment_header: String,
    /// The requirements the payment must satisfy.
    pub payment_requirements: PaymentRequirements,
}

/// Result of a settlement attempt.
///
/// All optional fields serialize explicitly as `null` when absent, so the
/// response shape is stable for clients that check field presence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleResponse {
    /// Whether the payment settled successfully.
    pub success: bool,
    /// Failure reason, when `success` is false.
    pub error: Option<String>,
    /// The on-chain transaction hash, when `success` is true.
    pub tx_hash: Option<String>,
    /// The network the payment settled on, when `success` is true.
    pub network_id: Option<String>,
}

impl SettleResponse {
    /// A successful settlement response.
    #[must_use]
    pub const fn settled(tx_hash: String, network_id: String) -> Self {
        Self {
            success: true,
            error: None,
            tx_hash: Some(tx_hash),
            network_id: Some(network_id),
        }
    }

    /// A failed settlement response carrying a reason.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            tx_hash: None,
            network_id: None,
        }
    }
}

/// HTTP 402 Payment Required response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequired {
    /// Protocol version (always 1).
    pub x402_version: X402Version1,
    /// List of acceptable payment methods.
    #[serde(default)]
    pub accepts: Vec<PaymentRequirements>,
    /// Optional error message if the request was malformed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A `(scheme, network)` pair a facilitator can settle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedKind {
    /// Protocol version (always 1).
    pub x402_version: X402Version1,
    /// The payment scheme.
    pub scheme: String,
    /// The network name.
    pub network: String,
}

impl SupportedKind {
    /// A V1 capability entry for the given scheme and network.
    pub fn v1(scheme: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            x402_version: V1,
            scheme: scheme.into(),
            network: network.into(),
        }
    }
}

/// Response listing every `(scheme, network)` pair a facilitator supports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedResponse {
    /// Supported capability entries.
    pub kinds: Vec<SupportedKind>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn version_marker_round_trips() {
        let v: X402Version1 = serde_json::from_str("1").unwrap();
        assert_eq!(serde_json::to_string(&v).unwrap(), "1");
    }

    #[test]
    fn version_marker_rejects_mismatch() {
        let err = serde_json::from_str::<X402Version1>("2");
        assert!(err.is_err());
    }

    #[test]
    fn requirements_parse_minimal() {
        let reqs: PaymentRequirements = serde_json::from_value(json!({
            "scheme": "x-solana-settlement",
            "network": "devnet",
            "maxAmountRequired": "10000",
            "payTo": "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin",
            "maxTimeoutSeconds": 60,
            "asset": "sol"
        }))
        .unwrap();
        assert_eq!(reqs.network, "devnet");
        assert_eq!(reqs.max_amount_required, "10000");
        assert!(reqs.resource.is_empty());
        assert!(reqs.extra.is_none());
    }

    #[test]
    fn settle_response_serializes_explicit_nulls() {
        let json = serde_json::to_value(SettleResponse::failure("invalid signature")).unwrap();
        assert_eq!(
            json,
            json!({
                "success": false,
                "error": "invalid signature",
                "txHash": null,
                "networkId": null
            })
        );
    }

    #[test]
    fn settle_response_settled_shape() {
        let json =
            serde_json::to_value(SettleResponse::settled("abc".into(), "devnet".into())).unwrap();
        assert_eq!(
            json,
            json!({
                "success": true,
                "error": null,
                "txHash": "abc",
                "networkId": "devnet"
            })
        );
    }

    #[test]
    fn payment_payload_keeps_body_opaque() {
        let payload: PaymentPayload = serde_json::from_value(json!({
            "x402Version": 1,
            "scheme": "x-solana-settlement",
            "network": "devnet",
            "payload": {"type": "transaction", "payer": "abc"}
        }))
        .unwrap();
        assert_eq!(payload.scheme, "x-solana-settlement");
        assert!(payload.payload.get().contains("transaction"));
    }

    #[test]
    fn supported_kind_wire_shape() {
        let json = serde_json::to_value(SupportedKind::v1("x-solana-settlement", "devnet")).unwrap();
        assert_eq!(
            json,
            json!({
                "x402Version": 1,
                "scheme": "x-solana-settlement",
                "network": "devnet"
            })
        );
    }
}
