//! Axum route handlers for the facilitator service.
//!
//! Endpoints:
//! - `POST /settle` - settle a payment from a base64 payment header
//! - `POST /accepts` - augment a 402 response's requirement entries
//! - `GET /supported` - list settleable `(scheme, network)` pairs
//! - `GET /health` - liveness probe

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde_json::Value;

use f402::encoding::decode_payment_header;
use f402::proto::{PaymentRequired, SettleRequest, SettleResponse, SupportedResponse, V1};

use crate::dispatcher::Dispatcher;
use crate::error::FacilitatorError;

/// Shared application state for the facilitator service.
pub type FacilitatorState = Arc<Dispatcher>;

/// `POST /settle` — Settles a payment against the registered handlers.
///
/// # Errors
///
/// Returns 400 with a failure body on malformed requests or when no
/// handler matches, 500 when a handler faults.
pub async fn post_settle(
    State(dispatcher): State<FacilitatorState>,
    Json(body): Json<Value>,
) -> Result<Json<SettleResponse>, FacilitatorError> {
    tracing::info!(request = %body, "received settlement request");
    let request: SettleRequest = serde_json::from_value(body)
        .map_err(|err| FacilitatorError::InvalidRequest(err.to_string()))?;
    let payload = decode_payment_header(&request.payment_header)?;
    let response = dispatcher
        .settle(&payload, &request.payment_requirements)
        .await?;
    Ok(Json(response))
}

/// `POST /accepts` — Augments requirement entries the handlers can settle.
///
/// # Errors
///
/// Returns 400 with a failure body when the request is malformed.
pub async fn post_accepts(
    State(dispatcher): State<FacilitatorState>,
    Json(body): Json<Value>,
) -> Result<Json<PaymentRequired>, FacilitatorError> {
    let request: PaymentRequired = serde_json::from_value(body)
        .map_err(|err| FacilitatorError::InvalidRequest(err.to_string()))?;
    let accepts = dispatcher.accepts(request.accepts).await;
    Ok(Json(PaymentRequired {
        x402_version: V1,
        accepts,
        error: None,
    }))
}

/// `GET /supported` — Lists every `(scheme, network)` pair the service
/// can settle.
pub async fn get_supported(State(dispatcher): State<FacilitatorState>) -> Json<SupportedResponse> {
    Json(dispatcher.supported().await)
}

/// `GET /health` — Liveness probe with the crate version.
pub async fn health() -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Creates an Axum [`axum::Router`] with all facilitator endpoints.
pub fn facilitator_router(state: FacilitatorState) -> axum::Router {
    axum::Router::new()
        .route("/settle", axum::routing::post(post_settle))
        .route("/accepts", axum::routing::post(post_accepts))
        .route("/supported", axum::routing::get(get_supported))
        .route("/health", axum::routing::get(health))
        .with_state(state)
}
