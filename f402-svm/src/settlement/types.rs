//! Scheme-specific payload types for x-solana-settlement.

use serde::{Deserialize, Serialize};

/// Body of a [`f402::PaymentPayload`] for the x-solana-settlement scheme.
///
/// Carries the payer, the ephemeral signing seed that binds the memo to
/// this payment attempt, and one of two proof styles: the full signed
/// transaction for the facilitator to submit, or the signature of a
/// transaction the client already submitted itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementPayload {
    /// Base58 public key of the paying wallet.
    pub payer: String,
    /// Base58 32-byte seed of the attempt's ephemeral ed25519 key.
    pub shared_secret_key: String,
    /// The payment proof.
    #[serde(flatten)]
    pub proof: PaymentProof,
}

/// The two proof styles a client can present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PaymentProof {
    /// A signed transaction, base58-serialized, for the facilitator to
    /// submit on the client's behalf.
    #[serde(rename_all = "camelCase")]
    Transaction {
        /// Base58 serialization of the signed versioned transaction.
        versioned_transaction: String,
    },
    /// The signature of a payment transaction the client submitted.
    #[serde(rename_all = "camelCase")]
    Signature {
        /// Base58 transaction signature.
        transaction_signature: String,
    },
}

impl SettlementPayload {
    /// Decodes the shared secret into a 32-byte ed25519 seed.
    #[must_use]
    pub fn shared_secret_seed(&self) -> Option<[u8; 32]> {
        let bytes = bs58::decode(&self.shared_secret_key).into_vec().ok()?;
        bytes.try_into().ok()
    }
}

/// The `extra` object a settlement handler attaches to payment
/// requirements it can settle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementsExtra {
    /// Base58 public key of the settlement authority.
    pub admin: String,
    /// A recent blockhash for the client to build its transaction with.
    pub recent_blockhash: String,
}
