//! Error types shared across the x402 crates.

/// Error raised while encoding or decoding protocol messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The payment header is not valid base64.
    #[error("payment header is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded payment header is not a valid payment payload.
    #[error("payment header is not a valid payment payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Unexpected failure inside a payment handler.
///
/// A handler returns this only for faults outside the settlement protocol
/// itself: RPC transport errors, missing configuration, serialization bugs.
/// Protocol-level rejections (bad signature, amount mismatch) are reported
/// through [`crate::handler::SettleOutcome::Failure`] instead, so the caller
/// can distinguish "this payment is bad" from "this handler is broken".
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Communication with the chain failed.
    #[error("rpc error: {0}")]
    Rpc(String),

    /// The handler is misconfigured and cannot operate.
    #[error("handler configuration error: {0}")]
    Config(String),

    /// An internal invariant was violated.
    #[error("internal handler error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Wraps any error as an RPC transport failure.
    pub fn rpc(err: impl std::fmt::Display) -> Self {
        Self::Rpc(err.to_string())
    }

    /// Wraps any error as an internal handler failure.
    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }
}
