//! Binary interface of the on-chain payment program.
//!
//! The escrow program holds a client's funds in a payment account derived
//! from a one-time nonce until the settlement authority (admin) settles it.
//! This module mirrors the program's published interface: its address,
//! instruction discriminators, argument layouts, account orderings, and PDA
//! derivation. Nothing here talks to the network.

use solana_instruction::{AccountMeta, Instruction};
use solana_pubkey::{Pubkey, pubkey};

/// The deployed payment program.
pub const PAYMENT_PROGRAM_ID: Pubkey = pubkey!("723zQLNKPPd2sZY9Bu1Rtqk27cwJhzYGc8pgt3dtJS4z");

/// The SPL memo program, used to bind a payment to its attempt signature.
pub const MEMO_PROGRAM_ID: Pubkey = pubkey!("MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr");

/// The associated token account program.
pub const ATA_PROGRAM_ID: Pubkey = pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

/// The system program.
pub const SYSTEM_PROGRAM_ID: Pubkey = pubkey!("11111111111111111111111111111111");

/// Anchor discriminator for `create_payment_sol`.
pub const CREATE_PAYMENT_SOL_DISCRIMINATOR: [u8; 8] = [34, 102, 228, 73, 166, 205, 253, 164];

/// Anchor discriminator for `create_payment_spl`.
pub const CREATE_PAYMENT_SPL_DISCRIMINATOR: [u8; 8] = [121, 30, 112, 26, 246, 53, 68, 140];

/// Anchor discriminator for `settle_payment`.
pub const SETTLE_PAYMENT_DISCRIMINATOR: [u8; 8] = [129, 7, 163, 250, 122, 226, 158, 249];

/// PDA seed prefix for payment accounts.
const PAYMENT_SEED: &[u8] = b"payment";

/// Arguments of the two `create_payment_*` instructions.
///
/// Borsh layout: 8-byte discriminator, `amount` as little-endian u64,
/// then the raw 32-byte nonce. 48 bytes total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatePaymentArgs {
    /// Payment amount in the asset's base units.
    pub amount: u64,
    /// One-time nonce; part of the payment account's PDA seeds.
    pub nonce: [u8; 32],
}

/// Which asset variant a `create_payment_*` instruction moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatePaymentVariant {
    /// Native SOL transfer into escrow.
    Sol,
    /// SPL token transfer into escrow.
    Spl,
}

/// Decodes a `create_payment_sol` or `create_payment_spl` instruction.
///
/// Fails closed: anything that is not exactly a well-formed create-payment
/// instruction yields `None`.
#[must_use]
pub fn decode_create_payment(data: &[u8]) -> Option<(CreatePaymentVariant, CreatePaymentArgs)> {
    if data.len() != 48 {
        return None;
    }
    let variant = match data[..8] {
        ref d if *d == CREATE_PAYMENT_SOL_DISCRIMINATOR => CreatePaymentVariant::Sol,
        ref d if *d == CREATE_PAYMENT_SPL_DISCRIMINATOR => CreatePaymentVariant::Spl,
        _ => return None,
    };
    let amount = u64::from_le_bytes(data[8..16].try_into().ok()?);
    let nonce: [u8; 32] = data[16..48].try_into().ok()?;
    Some((variant, CreatePaymentArgs { amount, nonce }))
}

fn encode_create_payment(discriminator: [u8; 8], args: &CreatePaymentArgs) -> Vec<u8> {
    let mut data = Vec::with_capacity(48);
    data.extend_from_slice(&discriminator);
    data.extend_from_slice(&args.amount.to_le_bytes());
    data.extend_from_slice(&args.nonce);
    data
}

/// Derives the payment account PDA for a nonce and payer.
#[must_use]
pub fn payment_account_address(nonce: &[u8; 32], payer: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[PAYMENT_SEED, nonce, payer.as_ref()],
        &PAYMENT_PROGRAM_ID,
    )
    .0
}

/// Derives the associated token account of `owner` for `mint`.
#[must_use]
pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[owner.as_ref(), spl_token::ID.as_ref(), mint.as_ref()],
        &ATA_PROGRAM_ID,
    )
    .0
}

/// Builds a `create_payment_sol` instruction escrowing `args.amount`
/// lamports from `payer`.
#[must_use]
pub fn create_payment_sol_instruction(
    args: &CreatePaymentArgs,
    payer: &Pubkey,
    receiver: &Pubkey,
    admin: &Pubkey,
) -> Instruction {
    let payment = payment_account_address(&args.nonce, payer);
    Instruction::new_with_bytes(
        PAYMENT_PROGRAM_ID,
        &encode_create_payment(CREATE_PAYMENT_SOL_DISCRIMINATOR, args),
        vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(*receiver, false),
            AccountMeta::new_readonly(*admin, false),
            AccountMeta::new(payment, false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
        ],
    )
}

/// Builds a `create_payment_spl` instruction escrowing `args.amount` base
/// units of `mint` from the payer's associated token account.
#[must_use]
pub fn create_payment_spl_instruction(
    args: &CreatePaymentArgs,
    payer: &Pubkey,
    receiver: &Pubkey,
    admin: &Pubkey,
    mint: &Pubkey,
) -> Instruction {
    let payment = payment_account_address(&args.nonce, payer);
    let payer_token_account = associated_token_address(payer, mint);
    let receiver_token_account = associated_token_address(receiver, mint);
    Instruction::new_with_bytes(
        PAYMENT_PROGRAM_ID,
        &encode_create_payment(CREATE_PAYMENT_SPL_DISCRIMINATOR, args),
        vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(*receiver, false),
            AccountMeta::new_readonly(*admin, false),
            AccountMeta::new_readonly(*mint, false),
            AccountMeta::new(payer_token_account, false),
            AccountMeta::new(receiver_token_account, false),
            AccountMeta::new(payment, false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
            AccountMeta::new_readonly(spl_token::ID, false),
        ],
    )
}

/// Builds a `settle_payment` instruction releasing the escrowed payment
/// identified by `(payment_nonce, original_payer)`.
///
/// Only the admin recorded in the payment account may settle it; the
/// program enforces this on-chain.
#[must_use]
pub fn settle_payment_instruction(
    admin: &Pubkey,
    original_payer: &Pubkey,
    payment_nonce: &[u8; 32],
    settle_nonce: &[u8; 32],
) -> Instruction {
    let payment = payment_account_address(payment_nonce, original_payer);
    let mut data = Vec::with_capacity(8 + 32 + 32 + 32);
    data.extend_from_slice(&SETTLE_PAYMENT_DISCRIMINATOR);
    data.extend_from_slice(original_payer.as_ref());
    data.extend_from_slice(payment_nonce);
    data.extend_from_slice(settle_nonce);
    Instruction::new_with_bytes(
        PAYMENT_PROGRAM_ID,
        &data,
        vec![
            AccountMeta::new(*admin, true),
            AccountMeta::new(payment, false),
            AccountMeta::new(*original_payer, false),
        ],
    )
}

/// Builds a memo instruction carrying `message` as UTF-8 data.
#[must_use]
pub fn memo_instruction(message: &str) -> Instruction {
    Instruction::new_with_bytes(MEMO_PROGRAM_ID, message.as_bytes(), vec![])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> CreatePaymentArgs {
        CreatePaymentArgs {
            amount: 10_000,
            nonce: [7u8; 32],
        }
    }

    #[test]
    fn create_payment_round_trips() {
        let encoded = encode_create_payment(CREATE_PAYMENT_SOL_DISCRIMINATOR, &args());
        assert_eq!(encoded.len(), 48);
        let (variant, decoded) = decode_create_payment(&encoded).unwrap();
        assert_eq!(variant, CreatePaymentVariant::Sol);
        assert_eq!(decoded, args());

        let encoded = encode_create_payment(CREATE_PAYMENT_SPL_DISCRIMINATOR, &args());
        let (variant, _) = decode_create_payment(&encoded).unwrap();
        assert_eq!(variant, CreatePaymentVariant::Spl);
    }

    #[test]
    fn decode_rejects_unknown_discriminator() {
        let mut encoded = encode_create_payment(CREATE_PAYMENT_SOL_DISCRIMINATOR, &args());
        encoded[0] ^= 0xff;
        assert!(decode_create_payment(&encoded).is_none());
    }

    #[test]
    fn decode_rejects_truncated_data() {
        let encoded = encode_create_payment(CREATE_PAYMENT_SOL_DISCRIMINATOR, &args());
        assert!(decode_create_payment(&encoded[..47]).is_none());
        assert!(decode_create_payment(&[]).is_none());
    }

    #[test]
    fn payment_pda_depends_on_nonce_and_payer() {
        let payer = Pubkey::new_unique();
        let a = payment_account_address(&[1u8; 32], &payer);
        let b = payment_account_address(&[1u8; 32], &payer);
        let c = payment_account_address(&[2u8; 32], &payer);
        let d = payment_account_address(&[1u8; 32], &Pubkey::new_unique());
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn settle_instruction_layout() {
        let admin = Pubkey::new_unique();
        let payer = Pubkey::new_unique();
        let ix = settle_payment_instruction(&admin, &payer, &[3u8; 32], &[4u8; 32]);
        assert_eq!(ix.program_id, PAYMENT_PROGRAM_ID);
        assert_eq!(ix.data.len(), 8 + 32 + 32 + 32);
        assert_eq!(ix.data[..8], SETTLE_PAYMENT_DISCRIMINATOR);
        assert_eq!(ix.data[8..40], *payer.as_ref());
        assert_eq!(ix.accounts.len(), 3);
        assert!(ix.accounts[0].is_signer);
        assert_eq!(ix.accounts[2].pubkey, payer);
    }

    #[test]
    fn memo_instruction_carries_utf8() {
        let ix = memo_instruction("deadbeef");
        assert_eq!(ix.program_id, MEMO_PROGRAM_ID);
        assert_eq!(ix.data, b"deadbeef");
        assert!(ix.accounts.is_empty());
    }
}
