//! The x-solana-settlement facilitator handler.
//!
//! One handler instance covers one `(network, asset)` pair: it augments
//! matching payment requirements with its settlement authority and a fresh
//! blockhash, verifies client payment transactions against the on-chain
//! payment program, and settles the escrowed funds with the admin key.

use std::sync::Arc;

use serde_json::Value;
use solana_keypair::Keypair;
use solana_message::v0::Message as MessageV0;
use solana_message::VersionedMessage;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_signer::Signer;
use solana_transaction::versioned::VersionedTransaction;

use f402::handler::{BoxFuture, PaymentHandler, SettleOutcome};
use f402::proto::{PaymentPayload, PaymentRequirements, SupportedKind};
use f402::HandlerError;

use crate::chain::SettlementProvider;
use crate::program::settle_payment_instruction;
use crate::settlement::types::{PaymentProof, SettlementPayload};
use crate::settlement::verify::{
    extract_transfer_data, has_payment_instruction, verify_memo_signature,
};

pub mod types;
pub mod verify;

/// Scheme identifier for this settlement style.
pub const X402_SCHEME: &str = "x-solana-settlement";

/// Facilitator-side handler settling escrowed payments on one network.
#[derive(Debug)]
pub struct SolanaSettlementHandler<P> {
    network: String,
    provider: P,
    admin: Arc<Keypair>,
    mint: Option<Pubkey>,
}

impl<P: SettlementProvider> SolanaSettlementHandler<P> {
    /// Creates a handler for `network`, settling with `admin`.
    ///
    /// With a `mint` the handler covers that SPL token; without one it
    /// covers native SOL.
    pub fn new(
        network: impl Into<String>,
        provider: P,
        admin: Arc<Keypair>,
        mint: Option<Pubkey>,
    ) -> Self {
        Self {
            network: network.into(),
            provider,
            admin,
            mint,
        }
    }

    /// The asset identifier this handler covers on the wire.
    #[must_use]
    pub fn asset(&self) -> String {
        self.mint
            .as_ref()
            .map_or_else(|| "sol".to_string(), Pubkey::to_string)
    }

    fn matches_tuple(&self, scheme: &str, network: &str) -> bool {
        scheme == X402_SCHEME && network == self.network
    }

    async fn augment_requirements(
        &self,
        accepts: &[PaymentRequirements],
    ) -> Result<Vec<PaymentRequirements>, HandlerError> {
        let asset = self.asset();
        let matching: Vec<&PaymentRequirements> = accepts
            .iter()
            .filter(|r| self.matches_tuple(&r.scheme, &r.network) && r.asset == asset)
            .collect();
        if matching.is_empty() {
            return Ok(Vec::new());
        }
        let blockhash = self
            .provider
            .latest_blockhash()
            .await
            .map_err(HandlerError::rpc)?;
        Ok(matching
            .into_iter()
            .map(|r| {
                let mut augmented = r.clone();
                let mut extra = match augmented.extra.take() {
                    Some(Value::Object(map)) => map,
                    _ => serde_json::Map::new(),
                };
                extra.insert(
                    "admin".to_string(),
                    Value::String(self.admin.pubkey().to_string()),
                );
                extra.insert(
                    "recentBlockhash".to_string(),
                    Value::String(blockhash.to_string()),
                );
                augmented.extra = Some(Value::Object(extra));
                augmented
            })
            .collect())
    }

    /// Resolves the payment transaction signature from the client's proof.
    async fn payment_signature(&self, proof: &PaymentProof) -> Option<Signature> {
        match proof {
            PaymentProof::Signature {
                transaction_signature,
            } => transaction_signature.parse().ok(),
            PaymentProof::Transaction {
                versioned_transaction,
            } => {
                let bytes = bs58::decode(versioned_transaction).into_vec().ok()?;
                let tx: VersionedTransaction = bincode::deserialize(&bytes).ok()?;
                match self.provider.send_and_confirm(&tx).await {
                    Ok(signature) => Some(signature),
                    Err(err) => {
                        tracing::warn!(error = %err, "payment transaction submission failed");
                        None
                    }
                }
            }
        }
    }

    async fn settle(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<SettleOutcome, HandlerError> {
        if !self.matches_tuple(&payload.scheme, &payload.network) {
            return Ok(SettleOutcome::NotApplicable);
        }

        let body: SettlementPayload = match serde_json::from_str(payload.payload.get()) {
            Ok(body) => body,
            Err(err) => {
                return Ok(SettleOutcome::Failure(format!(
                    "invalid payment payload: {err}"
                )));
            }
        };
        tracing::info!(payer = %body.payer, network = %payload.network, "settling payment");

        let Some(signature) = self.payment_signature(&body.proof).await else {
            return Ok(SettleOutcome::Failure("invalid signature".to_string()));
        };
        tracing::info!(%signature, "payment signature");

        let transaction = self
            .provider
            .get_transaction(&signature)
            .await
            .map_err(HandlerError::rpc)?;
        let Some(transaction) = transaction else {
            return Ok(SettleOutcome::Failure(
                "could not retrieve transaction".to_string(),
            ));
        };

        if !has_payment_instruction(&transaction) {
            return Ok(SettleOutcome::Failure("invalid transaction".to_string()));
        }

        let Some(transfer) = extract_transfer_data(&transaction) else {
            return Ok(SettleOutcome::Failure(
                "could not extract transfer data".to_string(),
            ));
        };

        let memo_valid = body.shared_secret_seed().is_some_and(|seed| {
            let ephemeral = Keypair::new_from_array(seed);
            verify_memo_signature(
                &transaction,
                &ephemeral.pubkey(),
                &transfer.args.amount.to_string(),
            )
        });
        if !memo_valid {
            return Ok(SettleOutcome::Failure(
                "could not verify memo signature".to_string(),
            ));
        }

        let amount_matches = requirements
            .max_amount_required
            .parse::<u64>()
            .is_ok_and(|required| required == transfer.args.amount);
        if !amount_matches {
            return Ok(SettleOutcome::Failure(
                "payments didn't match amount".to_string(),
            ));
        }

        let Some(settle_tx) = self.build_settle_transaction(&transfer.payer, &transfer.args.nonce).await
        else {
            return Ok(SettleOutcome::Failure(
                "couldn't create settlement tx".to_string(),
            ));
        };

        match self.provider.send_and_confirm(&settle_tx).await {
            Ok(settle_signature) => {
                tracing::info!(%settle_signature, "payment settled");
                Ok(SettleOutcome::Settled {
                    tx_hash: settle_signature.to_string(),
                    network_id: payload.network.clone(),
                })
            }
            Err(err) => {
                tracing::warn!(error = %err, "settlement submission failed");
                Ok(SettleOutcome::Failure(
                    "couldn't process settlement".to_string(),
                ))
            }
        }
    }

    async fn build_settle_transaction(
        &self,
        payer: &Pubkey,
        payment_nonce: &[u8; 32],
    ) -> Option<VersionedTransaction> {
        let settle_nonce: [u8; 32] = rand::random();
        let instruction = settle_payment_instruction(
            &self.admin.pubkey(),
            payer,
            payment_nonce,
            &settle_nonce,
        );
        let blockhash = match self.provider.latest_blockhash().await {
            Ok(blockhash) => blockhash,
            Err(err) => {
                tracing::warn!(error = %err, "could not fetch blockhash for settlement");
                return None;
            }
        };
        let message =
            MessageV0::try_compile(&self.admin.pubkey(), &[instruction], &[], blockhash).ok()?;
        VersionedTransaction::try_new(VersionedMessage::V0(message), &[self.admin.as_ref()]).ok()
    }
}

impl<P: SettlementProvider + 'static> PaymentHandler for SolanaSettlementHandler<P> {
    fn get_requirements<'a>(
        &'a self,
        accepts: &'a [PaymentRequirements],
    ) -> BoxFuture<'a, Result<Vec<PaymentRequirements>, HandlerError>> {
        Box::pin(self.augment_requirements(accepts))
    }

    fn handle_settle<'a>(
        &'a self,
        payload: &'a PaymentPayload,
        requirements: &'a PaymentRequirements,
    ) -> BoxFuture<'a, Result<SettleOutcome, HandlerError>> {
        Box::pin(self.settle(payload, requirements))
    }

    fn supported(&self) -> BoxFuture<'_, Vec<SupportedKind>> {
        Box::pin(async move { vec![SupportedKind::v1(X402_SCHEME, self.network.clone())] })
    }
}
