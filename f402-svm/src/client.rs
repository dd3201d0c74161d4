//! Client-side payment construction.
//!
//! Builds the escrow payment transaction a resource server's requirements
//! ask for: a `create_payment_*` instruction moving the amount into the
//! payment PDA, plus a memo binding the attempt to a fresh ephemeral
//! ed25519 key. The [`Wallet`] trait lets integrations choose how the
//! transaction is assembled, signed, and (optionally) submitted.

use solana_instruction::Instruction;
use solana_keypair::Keypair;
use solana_message::v0::Message as MessageV0;
use solana_message::{Hash, VersionedMessage};
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_signer::Signer;
use solana_transaction::versioned::VersionedTransaction;

use f402::handler::BoxFuture;
use f402::proto::{PaymentPayload, PaymentRequirements, V1};

use crate::program::{
    CreatePaymentArgs, create_payment_sol_instruction, create_payment_spl_instruction,
    memo_instruction,
};
use crate::settlement::types::{PaymentProof, RequirementsExtra, SettlementPayload};
use crate::settlement::X402_SCHEME;

/// Errors from building a payment for a requirement entry.
#[derive(Debug, thiserror::Error)]
pub enum PaymentBuildError {
    /// The requirement targets a different scheme, network, or asset.
    #[error("payment requirements do not match this wallet")]
    RequirementMismatch,
    /// The requirement's `extra` is missing or malformed.
    #[error("couldn't validate requirements extra field: {0}")]
    InvalidExtra(String),
    /// A requirement field failed to parse.
    #[error("invalid requirements field: {0}")]
    InvalidRequirements(String),
    /// Transaction assembly, signing, or serialization failed.
    #[error("could not build payment transaction: {0}")]
    Build(String),
}

/// A wallet that can produce the client's payment transaction.
///
/// The three transaction methods are integration points with defaults: the
/// default build compiles an unsigned v0 message, the default update is a
/// no-op, and the default send returns `None`, meaning the transaction
/// itself (rather than a signature) is handed to the facilitator. Override
/// `send_transaction` to submit through the wallet and return the
/// signature instead.
pub trait Wallet: Send + Sync {
    /// The network this wallet operates on.
    fn network(&self) -> &str;

    /// The wallet's public key; pays for and signs the payment.
    fn pubkey(&self) -> Pubkey;

    /// Assembles a transaction from the payment instructions.
    fn build_transaction<'a>(
        &'a self,
        instructions: &'a [Instruction],
        recent_blockhash: Hash,
    ) -> BoxFuture<'a, Result<VersionedTransaction, PaymentBuildError>> {
        Box::pin(async move {
            let message =
                MessageV0::try_compile(&self.pubkey(), instructions, &[], recent_blockhash)
                    .map_err(|err| PaymentBuildError::Build(err.to_string()))?;
            let num_signatures = message.header.num_required_signatures as usize;
            Ok(VersionedTransaction {
                signatures: vec![Signature::default(); num_signatures],
                message: VersionedMessage::V0(message),
            })
        })
    }

    /// Post-processes the assembled transaction, typically to sign it.
    fn update_transaction<'a>(
        &'a self,
        tx: VersionedTransaction,
    ) -> BoxFuture<'a, Result<VersionedTransaction, PaymentBuildError>> {
        Box::pin(async move { Ok(tx) })
    }

    /// Optionally submits the transaction through the wallet.
    ///
    /// Returning `Some(signature)` switches the payload to the signature
    /// proof style; `None` ships the serialized transaction instead.
    fn send_transaction<'a>(
        &'a self,
        _tx: &'a VersionedTransaction,
    ) -> BoxFuture<'a, Result<Option<String>, PaymentBuildError>> {
        Box::pin(async move { Ok(None) })
    }
}

/// Whether a requirement entry targets this wallet and asset.
#[must_use]
pub fn matches_requirement(
    wallet: &dyn Wallet,
    mint: Option<&Pubkey>,
    requirements: &PaymentRequirements,
) -> bool {
    let asset = mint.map_or_else(|| "sol".to_string(), Pubkey::to_string);
    requirements.scheme == X402_SCHEME
        && requirements.network == wallet.network()
        && requirements.asset == asset
}

/// Builds a payment payload satisfying `requirements`.
///
/// Escrows the required amount (SOL, or `mint` when given) with a fresh
/// random nonce, signs the decimal amount string with a fresh ephemeral
/// key, and packages everything through the wallet's integration style.
///
/// # Errors
///
/// Returns an error when the requirement does not target this wallet, its
/// fields or `extra` fail to parse, or the wallet fails to assemble, sign,
/// or submit the transaction.
pub async fn build_payment<W: Wallet>(
    wallet: &W,
    mint: Option<&Pubkey>,
    requirements: &PaymentRequirements,
) -> Result<PaymentPayload, PaymentBuildError> {
    if !matches_requirement(wallet, mint, requirements) {
        return Err(PaymentBuildError::RequirementMismatch);
    }

    let extra = requirements
        .extra
        .clone()
        .ok_or_else(|| PaymentBuildError::InvalidExtra("missing".to_string()))?;
    let extra: RequirementsExtra = serde_json::from_value(extra)
        .map_err(|err| PaymentBuildError::InvalidExtra(err.to_string()))?;

    let amount: u64 = requirements
        .max_amount_required
        .parse()
        .map_err(|_| PaymentBuildError::InvalidRequirements("maxAmountRequired".to_string()))?;
    let receiver: Pubkey = requirements
        .pay_to
        .parse()
        .map_err(|_| PaymentBuildError::InvalidRequirements("payTo".to_string()))?;
    let admin: Pubkey = extra
        .admin
        .parse()
        .map_err(|_| PaymentBuildError::InvalidRequirements("extra.admin".to_string()))?;
    let recent_blockhash: Hash = extra
        .recent_blockhash
        .parse()
        .map_err(|_| PaymentBuildError::InvalidRequirements("extra.recentBlockhash".to_string()))?;

    let shared_secret: [u8; 32] = rand::random();
    let ephemeral = Keypair::new_from_array(shared_secret);
    let memo_signature = ephemeral.sign_message(amount.to_string().as_bytes());
    let memo = memo_instruction(&hex::encode(memo_signature.as_ref()));

    let args = CreatePaymentArgs {
        amount,
        nonce: rand::random(),
    };
    let payer = wallet.pubkey();
    let create = match mint {
        Some(mint) => create_payment_spl_instruction(&args, &payer, &receiver, &admin, mint),
        None => create_payment_sol_instruction(&args, &payer, &receiver, &admin),
    };

    let instructions = [create, memo];
    let tx = wallet.build_transaction(&instructions, recent_blockhash).await?;
    let tx = wallet.update_transaction(tx).await?;

    let proof = match wallet.send_transaction(&tx).await? {
        Some(transaction_signature) => PaymentProof::Signature {
            transaction_signature,
        },
        None => {
            let bytes = bincode::serialize(&tx)
                .map_err(|err| PaymentBuildError::Build(err.to_string()))?;
            PaymentProof::Transaction {
                versioned_transaction: bs58::encode(bytes).into_string(),
            }
        }
    };

    let body = SettlementPayload {
        payer: payer.to_string(),
        shared_secret_key: bs58::encode(shared_secret).into_string(),
        proof,
    };
    let body = serde_json::value::to_raw_value(&body)
        .map_err(|err| PaymentBuildError::Build(err.to_string()))?;
    Ok(PaymentPayload {
        x402_version: V1,
        scheme: X402_SCHEME.to_string(),
        network: wallet.network().to_string(),
        payload: body,
    })
}
