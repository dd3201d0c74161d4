//! Dispatcher behavior across ordered payment handlers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use f402::handler::{BoxFuture, PaymentHandler, SettleOutcome};
use f402::proto::{PaymentPayload, PaymentRequirements, SupportedKind, V1};
use f402::HandlerError;
use f402_facilitator::dispatcher::{Dispatcher, Timeouts};
use f402_facilitator::error::FacilitatorError;

/// A handler with a fixed settlement script and fixed requirement entries.
struct ScriptedHandler {
    outcome: Result<SettleOutcome, String>,
    entries: Vec<PaymentRequirements>,
    kinds: Vec<SupportedKind>,
    delay: Duration,
    settle_calls: Arc<AtomicUsize>,
}

impl ScriptedHandler {
    fn new(outcome: Result<SettleOutcome, String>) -> Self {
        Self {
            outcome,
            entries: Vec::new(),
            kinds: Vec::new(),
            delay: Duration::ZERO,
            settle_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn with_entries(mut self, entries: Vec<PaymentRequirements>) -> Self {
        self.entries = entries;
        self
    }

    fn with_kinds(mut self, kinds: Vec<SupportedKind>) -> Self {
        self.kinds = kinds;
        self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.settle_calls)
    }
}

impl PaymentHandler for ScriptedHandler {
    fn get_requirements<'a>(
        &'a self,
        _accepts: &'a [PaymentRequirements],
    ) -> BoxFuture<'a, Result<Vec<PaymentRequirements>, HandlerError>> {
        Box::pin(async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(self.entries.clone())
        })
    }

    fn handle_settle<'a>(
        &'a self,
        _payload: &'a PaymentPayload,
        _requirements: &'a PaymentRequirements,
    ) -> BoxFuture<'a, Result<SettleOutcome, HandlerError>> {
        Box::pin(async move {
            self.settle_calls.fetch_add(1, Ordering::SeqCst);
            self.outcome
                .clone()
                .map_err(HandlerError::Rpc)
        })
    }

    fn supported(&self) -> BoxFuture<'_, Vec<SupportedKind>> {
        Box::pin(async move { self.kinds.clone() })
    }
}

fn requirements(network: &str) -> PaymentRequirements {
    PaymentRequirements {
        scheme: "x-solana-settlement".to_string(),
        network: network.to_string(),
        max_amount_required: "10000".to_string(),
        resource: String::new(),
        description: String::new(),
        mime_type: String::new(),
        output_schema: None,
        pay_to: "receiver".to_string(),
        max_timeout_seconds: 60,
        asset: "sol".to_string(),
        extra: None,
    }
}

fn payload() -> PaymentPayload {
    PaymentPayload {
        x402_version: V1,
        scheme: "x-solana-settlement".to_string(),
        network: "devnet".to_string(),
        payload: serde_json::value::RawValue::from_string("{}".to_string()).unwrap(),
    }
}

fn settled(network: &str) -> SettleOutcome {
    SettleOutcome::Settled {
        tx_hash: "sig".to_string(),
        network_id: network.to_string(),
    }
}

#[tokio::test]
async fn settle_walks_handlers_in_order() {
    let first = ScriptedHandler::new(Ok(SettleOutcome::NotApplicable));
    let second = ScriptedHandler::new(Ok(settled("devnet")));
    let third = ScriptedHandler::new(Ok(settled("mainnet-beta")));
    let third_calls = third.calls();

    let dispatcher = Dispatcher::new(
        vec![Arc::new(first), Arc::new(second), Arc::new(third)],
        Timeouts::default(),
    );
    let response = dispatcher
        .settle(&payload(), &requirements("devnet"))
        .await
        .unwrap();
    assert!(response.success);
    assert_eq!(response.network_id.as_deref(), Some("devnet"));
    // Settlement stopped at the second handler.
    assert_eq!(third_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn handler_failure_short_circuits() {
    let first = ScriptedHandler::new(Ok(SettleOutcome::Failure(
        "payments didn't match amount".to_string(),
    )));
    let second = ScriptedHandler::new(Ok(settled("devnet")));
    let second_calls = second.calls();

    let dispatcher = Dispatcher::new(vec![Arc::new(first), Arc::new(second)], Timeouts::default());
    let response = dispatcher
        .settle(&payload(), &requirements("devnet"))
        .await
        .unwrap();
    assert!(!response.success);
    assert_eq!(
        response.error.as_deref(),
        Some("payments didn't match amount")
    );
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn handler_error_aborts_the_walk() {
    let first = ScriptedHandler::new(Err("rpc down".to_string()));
    let second = ScriptedHandler::new(Ok(settled("devnet")));
    let second_calls = second.calls();

    let dispatcher = Dispatcher::new(vec![Arc::new(first), Arc::new(second)], Timeouts::default());
    let result = dispatcher.settle(&payload(), &requirements("devnet")).await;
    assert!(matches!(result, Err(FacilitatorError::Handler(_))));
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn exhausted_handlers_report_no_match() {
    let first = ScriptedHandler::new(Ok(SettleOutcome::NotApplicable));
    let second = ScriptedHandler::new(Ok(SettleOutcome::NotApplicable));

    let dispatcher = Dispatcher::new(vec![Arc::new(first), Arc::new(second)], Timeouts::default());
    let result = dispatcher.settle(&payload(), &requirements("devnet")).await;
    assert!(matches!(result, Err(FacilitatorError::NoMatchingHandler)));
}

#[tokio::test]
async fn empty_dispatcher_reports_no_match() {
    let dispatcher = Dispatcher::new(vec![], Timeouts::default());
    let result = dispatcher.settle(&payload(), &requirements("devnet")).await;
    assert!(matches!(result, Err(FacilitatorError::NoMatchingHandler)));
}

#[tokio::test(start_paused = true)]
async fn accepts_aggregates_and_drops_timed_out_handlers() {
    let fast = ScriptedHandler::new(Ok(SettleOutcome::NotApplicable))
        .with_entries(vec![requirements("devnet")]);
    let slow = ScriptedHandler::new(Ok(SettleOutcome::NotApplicable))
        .with_entries(vec![requirements("mainnet-beta")])
        .with_delay(Duration::from_secs(60));

    let dispatcher = Dispatcher::new(vec![Arc::new(fast), Arc::new(slow)], Timeouts::default());
    let accepts = dispatcher.accepts(vec![requirements("devnet")]).await;
    assert_eq!(accepts.len(), 1);
    assert_eq!(accepts[0].network, "devnet");
}

#[tokio::test]
async fn supported_aggregates_all_handlers() {
    let sol = ScriptedHandler::new(Ok(SettleOutcome::NotApplicable))
        .with_kinds(vec![SupportedKind::v1("x-solana-settlement", "devnet")]);
    let usdc = ScriptedHandler::new(Ok(SettleOutcome::NotApplicable)).with_kinds(vec![
        SupportedKind::v1("x-solana-settlement", "mainnet-beta"),
    ]);

    let dispatcher = Dispatcher::new(vec![Arc::new(sol), Arc::new(usdc)], Timeouts::default());
    let supported = dispatcher.supported().await;
    assert_eq!(supported.kinds.len(), 2);
    assert_eq!(supported.kinds[0].network, "devnet");
    assert_eq!(supported.kinds[1].network, "mainnet-beta");
}
