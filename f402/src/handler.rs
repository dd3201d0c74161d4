//! The payment handler contract.
//!
//! A facilitator holds an ordered list of [`PaymentHandler`]s, typically one
//! per `(network, asset)` pair. Requirement augmentation and capability
//! listing fan out across all handlers; settlement walks them in order until
//! one claims the payment.

use std::future::Future;
use std::pin::Pin;

use crate::error::HandlerError;
use crate::proto::{PaymentPayload, PaymentRequirements, SettleResponse, SupportedKind};

/// A boxed future, as returned by [`PaymentHandler`] methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of a settlement attempt by a single handler.
///
/// Distinguishes "this payment is not mine" from "this payment is mine and
/// bad", so the dispatcher knows whether to try the next handler or stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleOutcome {
    /// The payment does not target this handler; try the next one.
    NotApplicable,
    /// The handler claims this payment and rejects it for the given reason.
    Failure(String),
    /// The payment settled on-chain.
    Settled {
        /// Signature of the settlement transaction.
        tx_hash: String,
        /// Network the payment settled on.
        network_id: String,
    },
}

impl SettleOutcome {
    /// Converts a terminal outcome into the wire response.
    ///
    /// Returns `None` for [`SettleOutcome::NotApplicable`], which has no
    /// wire representation of its own.
    #[must_use]
    pub fn into_response(self) -> Option<SettleResponse> {
        match self {
            Self::NotApplicable => None,
            Self::Failure(error) => Some(SettleResponse::failure(error)),
            Self::Settled {
                tx_hash,
                network_id,
            } => Some(SettleResponse::settled(tx_hash, network_id)),
        }
    }
}

/// A settlement backend for one payment scheme on one network.
///
/// Implementations must be cheap to share (`Arc`) and safe to call
/// concurrently: requirement augmentation and capability listing run
/// fanned-out across all handlers under a shared deadline.
pub trait PaymentHandler: Send + Sync {
    /// Augments the requirement entries this handler can settle.
    ///
    /// Returns a (possibly empty) list of augmented copies of the matching
    /// entries, for example with a settlement admin key and a recent
    /// blockhash attached to `extra`. Entries for other schemes or networks
    /// are skipped, not errored.
    fn get_requirements<'a>(
        &'a self,
        accepts: &'a [PaymentRequirements],
    ) -> BoxFuture<'a, Result<Vec<PaymentRequirements>, HandlerError>>;

    /// Attempts to settle a payment.
    ///
    /// Returns [`SettleOutcome::NotApplicable`] when the payload targets a
    /// different scheme or network. `Err` is reserved for faults outside
    /// the payment itself (see [`HandlerError`]).
    fn handle_settle<'a>(
        &'a self,
        payload: &'a PaymentPayload,
        requirements: &'a PaymentRequirements,
    ) -> BoxFuture<'a, Result<SettleOutcome, HandlerError>>;

    /// Lists the `(scheme, network)` pairs this handler can settle.
    fn supported(&self) -> BoxFuture<'_, Vec<SupportedKind>> {
        Box::pin(async { Vec::new() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_applicable_has_no_response() {
        assert_eq!(SettleOutcome::NotApplicable.into_response(), None);
    }

    #[test]
    fn failure_maps_to_unsuccessful_response() {
        let resp = SettleOutcome::Failure("invalid transaction".into())
            .into_response()
            .unwrap();
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("invalid transaction"));
        assert_eq!(resp.tx_hash, None);
    }

    #[test]
    fn settled_maps_to_successful_response() {
        let resp = SettleOutcome::Settled {
            tx_hash: "sig".into(),
            network_id: "devnet".into(),
        }
        .into_response()
        .unwrap();
        assert!(resp.success);
        assert_eq!(resp.tx_hash.as_deref(), Some("sig"));
        assert_eq!(resp.network_id.as_deref(), Some("devnet"));
    }
}
