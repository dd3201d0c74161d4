//! RPC access to the settlement chain.
//!
//! [`SettlementProvider`] is the seam between the settlement handler and the
//! network: the handler only ever needs a recent blockhash, a way to submit
//! a transaction and wait for confirmation, and a way to fetch a confirmed
//! transaction with its CPI metadata. [`RpcSettlementProvider`] is the real
//! implementation over a nonblocking RPC client; tests substitute their own.

use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcTransactionConfig;
use solana_commitment_config::CommitmentConfig;
use solana_message::Hash;
use solana_signature::Signature;
use solana_transaction::versioned::VersionedTransaction;
use solana_transaction_status_client_types::option_serializer::OptionSerializer;
use solana_transaction_status_client_types::{UiInnerInstructions, UiTransactionEncoding};

/// How long to wait for a submitted transaction to confirm before giving up.
const CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Interval between confirmation polls.
const CONFIRMATION_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Errors from the settlement chain RPC layer.
#[derive(Debug, thiserror::Error)]
pub enum SettlementRpcError {
    /// RPC transport error.
    #[error(transparent)]
    Transport(Box<ClientErrorKind>),
    /// The transaction landed on-chain but its execution failed.
    #[error("transaction {0} failed on-chain: {1}")]
    ExecutionFailed(Signature, String),
    /// The transaction was submitted but never confirmed.
    #[error("transaction {0} was not confirmed in time")]
    ConfirmationTimeout(Signature),
}

impl From<ClientError> for SettlementRpcError {
    fn from(value: ClientError) -> Self {
        Self::Transport(value.kind)
    }
}

/// A confirmed transaction in the shape settlement verification needs.
///
/// Pairs the decoded transaction message with the CPI sets recorded in its
/// meta. Transactions whose meta carries an execution error are never
/// surfaced as this type.
#[derive(Debug, Clone)]
pub struct ConfirmedPaymentTransaction {
    /// The decoded transaction, including its message and account keys.
    pub transaction: VersionedTransaction,
    /// Inner instruction sets (CPIs), in execution order.
    pub inner_instructions: Vec<UiInnerInstructions>,
}

/// Chain operations needed to verify and settle payments.
pub trait SettlementProvider: Send + Sync {
    /// Fetches a recent blockhash at confirmed commitment.
    fn latest_blockhash(&self)
    -> impl Future<Output = Result<Hash, SettlementRpcError>> + Send;

    /// Submits a signed transaction and waits until it confirms.
    ///
    /// Errors immediately when the transaction lands but fails on-chain;
    /// confirmation never waits out the deadline on a dead transaction.
    fn send_and_confirm(
        &self,
        tx: &VersionedTransaction,
    ) -> impl Future<Output = Result<Signature, SettlementRpcError>> + Send;

    /// Fetches a confirmed transaction by signature.
    ///
    /// Returns `None` when the transaction is unknown to the cluster or
    /// failed on-chain.
    fn get_transaction(
        &self,
        signature: &Signature,
    ) -> impl Future<Output = Result<Option<ConfirmedPaymentTransaction>, SettlementRpcError>> + Send;
}

/// [`SettlementProvider`] backed by a JSON-RPC endpoint.
pub struct RpcSettlementProvider {
    rpc_client: Arc<RpcClient>,
}

impl Debug for RpcSettlementProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcSettlementProvider")
            .field("rpc_url", &self.rpc_client.url())
            .finish()
    }
}

impl RpcSettlementProvider {
    /// Creates a provider over the given RPC endpoint at confirmed
    /// commitment.
    #[must_use]
    pub fn new(rpc_url: String) -> Self {
        let rpc_client = RpcClient::new_with_commitment(rpc_url, CommitmentConfig::confirmed());
        Self {
            rpc_client: Arc::new(rpc_client),
        }
    }

    /// The RPC endpoint this provider talks to.
    #[must_use]
    pub fn url(&self) -> String {
        self.rpc_client.url()
    }
}

impl SettlementProvider for RpcSettlementProvider {
    async fn latest_blockhash(&self) -> Result<Hash, SettlementRpcError> {
        let blockhash = self.rpc_client.get_latest_blockhash().await?;
        Ok(blockhash)
    }

    async fn send_and_confirm(
        &self,
        tx: &VersionedTransaction,
    ) -> Result<Signature, SettlementRpcError> {
        let signature = self.rpc_client.send_transaction(tx).await?;
        let deadline = tokio::time::Instant::now() + CONFIRMATION_TIMEOUT;
        loop {
            // An on-chain execution error is terminal; bail out instead of
            // polling until the deadline.
            let statuses = self.rpc_client.get_signature_statuses(&[signature]).await?;
            if let Some(Some(status)) = statuses.value.first() {
                if let Some(err) = &status.err {
                    return Err(SettlementRpcError::ExecutionFailed(
                        signature,
                        err.to_string(),
                    ));
                }
                if status.satisfies_commitment(CommitmentConfig::confirmed()) {
                    return Ok(signature);
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(SettlementRpcError::ConfirmationTimeout(signature));
            }
            tokio::time::sleep(CONFIRMATION_POLL_INTERVAL).await;
        }
    }

    async fn get_transaction(
        &self,
        signature: &Signature,
    ) -> Result<Option<ConfirmedPaymentTransaction>, SettlementRpcError> {
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Base64),
            commitment: Some(CommitmentConfig::confirmed()),
            max_supported_transaction_version: Some(0),
        };
        let fetched = match self
            .rpc_client
            .get_transaction_with_config(signature, config)
            .await
        {
            Ok(fetched) => fetched,
            Err(err) => {
                // The RPC surfaces unknown signatures as errors; either way
                // there is no transaction to verify.
                tracing::debug!(%signature, error = %err, "transaction lookup failed");
                return Ok(None);
            }
        };
        let Some(meta) = fetched.transaction.meta else {
            return Ok(None);
        };
        if meta.err.is_some() {
            return Ok(None);
        }
        let Some(transaction) = fetched.transaction.transaction.decode() else {
            return Ok(None);
        };
        let inner_instructions = match meta.inner_instructions {
            OptionSerializer::Some(sets) => sets,
            OptionSerializer::None | OptionSerializer::Skip => Vec::new(),
        };
        Ok(Some(ConfirmedPaymentTransaction {
            transaction,
            inner_instructions,
        }))
    }
}

impl<T: SettlementProvider> SettlementProvider for Arc<T> {
    fn latest_blockhash(
        &self,
    ) -> impl Future<Output = Result<Hash, SettlementRpcError>> + Send {
        (**self).latest_blockhash()
    }

    fn send_and_confirm(
        &self,
        tx: &VersionedTransaction,
    ) -> impl Future<Output = Result<Signature, SettlementRpcError>> + Send {
        (**self).send_and_confirm(tx)
    }

    fn get_transaction(
        &self,
        signature: &Signature,
    ) -> impl Future<Output = Result<Option<ConfirmedPaymentTransaction>, SettlementRpcError>> + Send
    {
        (**self).get_transaction(signature)
    }
}
