//! Error types for the facilitator service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use f402::proto::SettleResponse;
use f402::{HandlerError, ProtocolError};

/// Errors a facilitator endpoint can answer with.
///
/// Every variant renders as a [`SettleResponse`] body carrying the error
/// message, so clients see one stable shape whether settlement failed in a
/// handler or never reached one.
#[derive(Debug, thiserror::Error)]
pub enum FacilitatorError {
    /// The request body did not match the expected shape.
    #[error("couldn't validate request: {0}")]
    InvalidRequest(String),

    /// The payment header did not decode into a payment payload.
    #[error("couldn't validate x402 payload: {0}")]
    InvalidPayload(#[from] ProtocolError),

    /// A handler failed outside the settlement protocol itself.
    #[error(transparent)]
    Handler(#[from] HandlerError),

    /// Every handler declined the payment.
    #[error("no matching payment handler found")]
    NoMatchingHandler,
}

impl IntoResponse for FacilitatorError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidRequest(_) | Self::InvalidPayload(_) | Self::NoMatchingHandler => {
                StatusCode::BAD_REQUEST
            }
            Self::Handler(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = SettleResponse::failure(self.to_string());
        (status, axum::Json(body)).into_response()
    }
}
