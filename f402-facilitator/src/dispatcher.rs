//! Routing of facilitator operations across payment handlers.
//!
//! The dispatcher holds an ordered list of handlers. Requirement
//! augmentation and capability listing fan out to every handler
//! concurrently under a shared deadline; settlement walks the handlers in
//! registration order and stops at the first one that claims the payment.

use std::sync::Arc;
use std::time::Duration;

use f402::handler::{PaymentHandler, SettleOutcome};
use f402::proto::{PaymentPayload, PaymentRequirements, SettleResponse, SupportedResponse};

use crate::error::FacilitatorError;
use crate::fanout::join_settled_with_timeout;

/// Shared deadlines for the fan-out operations.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Deadline for requirement augmentation across all handlers.
    pub get_requirements: Duration,
    /// Deadline for capability listing across all handlers.
    pub supported: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            get_requirements: Duration::from_millis(500),
            supported: Duration::from_millis(500),
        }
    }
}

/// The fields of a requirement entry worth putting in a log line.
#[derive(Debug)]
struct RequirementsSummary<'a> {
    scheme: &'a str,
    network: &'a str,
    asset: &'a str,
    pay_to: &'a str,
}

impl<'a> From<&'a PaymentRequirements> for RequirementsSummary<'a> {
    fn from(r: &'a PaymentRequirements) -> Self {
        Self {
            scheme: &r.scheme,
            network: &r.network,
            asset: &r.asset,
            pay_to: &r.pay_to,
        }
    }
}

/// Ordered collection of payment handlers behind the facilitator API.
#[derive(Clone)]
pub struct Dispatcher {
    handlers: Vec<Arc<dyn PaymentHandler>>,
    timeouts: Timeouts,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handlers", &self.handlers.len())
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

impl Dispatcher {
    /// Creates a dispatcher over `handlers`, tried in the given order.
    #[must_use]
    pub fn new(handlers: Vec<Arc<dyn PaymentHandler>>, timeouts: Timeouts) -> Self {
        Self { handlers, timeouts }
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Collects augmented requirement entries from every handler.
    ///
    /// Handlers that error or miss the deadline are logged and skipped;
    /// their absence never hides the other handlers' entries.
    pub async fn accepts(&self, accepts: Vec<PaymentRequirements>) -> Vec<PaymentRequirements> {
        let handles = self
            .handlers
            .iter()
            .map(|handler| {
                let handler = Arc::clone(handler);
                let accepts = accepts.clone();
                tokio::spawn(async move { handler.get_requirements(&accepts).await })
            })
            .collect();
        let results = join_settled_with_timeout(handles, self.timeouts.get_requirements).await;

        let mut augmented = Vec::new();
        for result in results {
            match result {
                Ok(Ok(entries)) => augmented.extend(entries),
                Ok(Err(err)) => {
                    tracing::error!(error = %err, "failed to retrieve requirements from handler");
                }
                Err(err) => {
                    tracing::error!(error = %err, "failed to retrieve requirements from handler");
                }
            }
        }
        tracing::info!(
            count = augmented.len(),
            accepts = ?augmented.iter().map(RequirementsSummary::from).collect::<Vec<_>>(),
            "returning accepts"
        );
        augmented
    }

    /// Collects the supported `(scheme, network)` pairs from every handler.
    pub async fn supported(&self) -> SupportedResponse {
        let handles = self
            .handlers
            .iter()
            .map(|handler| {
                let handler = Arc::clone(handler);
                tokio::spawn(async move { handler.supported().await })
            })
            .collect();
        let results = join_settled_with_timeout(handles, self.timeouts.supported).await;

        let mut kinds = Vec::new();
        for result in results {
            match result {
                Ok(entries) => kinds.extend(entries),
                Err(err) => {
                    tracing::error!(error = %err, "failed to retrieve supported kinds from handler");
                }
            }
        }
        tracing::info!(count = kinds.len(), "returning supported kinds");
        SupportedResponse { kinds }
    }

    /// Settles a payment with the first handler that claims it.
    ///
    /// Handlers run strictly in order. A handler returning
    /// [`SettleOutcome::NotApplicable`] passes the payment on; any terminal
    /// outcome stops the walk. A handler error aborts immediately without
    /// consulting later handlers.
    ///
    /// # Errors
    ///
    /// [`FacilitatorError::Handler`] when a handler fails outside the
    /// settlement protocol, [`FacilitatorError::NoMatchingHandler`] when
    /// every handler declines.
    pub async fn settle(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<SettleResponse, FacilitatorError> {
        let summary = RequirementsSummary::from(requirements);
        tracing::info!(requirements = ?summary, "starting settlement attempt");

        for handler in &self.handlers {
            let outcome = handler.handle_settle(payload, requirements).await?;
            let Some(response) = outcome.into_response() else {
                continue;
            };
            tracing::info!(
                success = response.success,
                tx_hash = ?response.tx_hash,
                requirements = ?summary,
                "handler accepted settlement"
            );
            return Ok(response);
        }

        tracing::warn!(
            requirements = ?summary,
            "attempt to settle was made with no handler found"
        );
        Err(FacilitatorError::NoMatchingHandler)
    }
}
