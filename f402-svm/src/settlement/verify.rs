//! Verification of client payment transactions.
//!
//! A valid payment transaction carries a `create_payment_*` instruction for
//! the payment program, either top-level or as a CPI, plus a memo whose data
//! is the hex-encoded ed25519 signature of the payment amount by the
//! attempt's ephemeral key. Top-level instructions carry raw bytes; inner
//! instruction data arrives base58-encoded from the RPC and is unwrapped
//! before decoding. Top-level matches win, inner sets are scanned in
//! encounter order.

use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_transaction_status_client_types::{UiCompiledInstruction, UiInstruction};

use crate::chain::ConfirmedPaymentTransaction;
use crate::program::{
    CreatePaymentArgs, CreatePaymentVariant, MEMO_PROGRAM_ID, PAYMENT_PROGRAM_ID,
    decode_create_payment,
};

/// What a payment transaction escrowed, extracted from its
/// `create_payment_*` instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferData {
    /// The paying account (first account of the create instruction).
    pub payer: Pubkey,
    /// Whether the escrow holds SOL or an SPL token.
    pub variant: CreatePaymentVariant,
    /// Decoded instruction arguments.
    pub args: CreatePaymentArgs,
}

fn key_at(tx: &ConfirmedPaymentTransaction, index: usize) -> Option<&Pubkey> {
    tx.transaction.message.static_account_keys().get(index)
}

fn inner_compiled(
    tx: &ConfirmedPaymentTransaction,
) -> impl Iterator<Item = &UiCompiledInstruction> {
    tx.inner_instructions
        .iter()
        .flat_map(|set| &set.instructions)
        .filter_map(|ix| match ix {
            UiInstruction::Compiled(compiled) => Some(compiled),
            _ => None,
        })
}

/// Whether the transaction invokes the payment program at all, top-level
/// or through a CPI.
#[must_use]
pub fn has_payment_instruction(tx: &ConfirmedPaymentTransaction) -> bool {
    let top_level = tx
        .transaction
        .message
        .instructions()
        .iter()
        .any(|ix| key_at(tx, ix.program_id_index as usize) == Some(&PAYMENT_PROGRAM_ID));
    if top_level {
        return true;
    }
    inner_compiled(tx)
        .any(|ix| key_at(tx, ix.program_id_index as usize) == Some(&PAYMENT_PROGRAM_ID))
}

/// Extracts the escrowed transfer from the first `create_payment_*`
/// instruction found.
///
/// Returns `None` when no such instruction exists or its data does not
/// decode as create-payment arguments.
#[must_use]
pub fn extract_transfer_data(tx: &ConfirmedPaymentTransaction) -> Option<TransferData> {
    for ix in tx.transaction.message.instructions() {
        if key_at(tx, ix.program_id_index as usize) != Some(&PAYMENT_PROGRAM_ID) {
            continue;
        }
        let payer = *key_at(tx, *ix.accounts.first()? as usize)?;
        let (variant, args) = decode_create_payment(&ix.data)?;
        return Some(TransferData {
            payer,
            variant,
            args,
        });
    }
    for ix in inner_compiled(tx) {
        if key_at(tx, ix.program_id_index as usize) != Some(&PAYMENT_PROGRAM_ID) {
            continue;
        }
        let payer = *key_at(tx, *ix.accounts.first()? as usize)?;
        let data = bs58::decode(&ix.data).into_vec().ok()?;
        let (variant, args) = decode_create_payment(&data)?;
        return Some(TransferData {
            payer,
            variant,
            args,
        });
    }
    None
}

/// Finds the raw data of the first memo instruction in the transaction.
fn find_memo_data(tx: &ConfirmedPaymentTransaction) -> Option<Vec<u8>> {
    for ix in tx.transaction.message.instructions() {
        if key_at(tx, ix.program_id_index as usize) == Some(&MEMO_PROGRAM_ID) {
            return Some(ix.data.clone());
        }
    }
    for ix in inner_compiled(tx) {
        if key_at(tx, ix.program_id_index as usize) == Some(&MEMO_PROGRAM_ID) {
            return bs58::decode(&ix.data).into_vec().ok();
        }
    }
    None
}

/// Verifies the transaction's memo binds `message` to `expected` key.
///
/// The memo data is the UTF-8 hex encoding of a 64-byte ed25519 signature
/// of `message`. Any missing or malformed piece fails verification.
#[must_use]
pub fn verify_memo_signature(
    tx: &ConfirmedPaymentTransaction,
    expected: &Pubkey,
    message: &str,
) -> bool {
    let Some(memo_data) = find_memo_data(tx) else {
        return false;
    };
    let Ok(hex_string) = String::from_utf8(memo_data) else {
        return false;
    };
    let Ok(signature_bytes) = hex::decode(hex_string.trim()) else {
        return false;
    };
    let Ok(signature) = Signature::try_from(signature_bytes.as_slice()) else {
        return false;
    };
    signature.verify(expected.as_ref(), message.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_keypair::Keypair;
    use solana_message::v0::Message as MessageV0;
    use solana_message::{Hash, MessageHeader, VersionedMessage};
    use solana_signer::Signer;
    use solana_transaction::versioned::VersionedTransaction;
    use solana_transaction_status_client_types::UiInnerInstructions;

    use crate::program::{create_payment_sol_instruction, memo_instruction};

    fn args() -> CreatePaymentArgs {
        CreatePaymentArgs {
            amount: 10_000,
            nonce: [9u8; 32],
        }
    }

    fn confirmed(
        instructions: &[solana_instruction::Instruction],
        payer: &Pubkey,
    ) -> ConfirmedPaymentTransaction {
        let message = MessageV0::try_compile(payer, instructions, &[], Hash::default()).unwrap();
        ConfirmedPaymentTransaction {
            transaction: VersionedTransaction {
                signatures: vec![Signature::default()],
                message: VersionedMessage::V0(message),
            },
            inner_instructions: vec![],
        }
    }

    #[test]
    fn extracts_top_level_create_payment() {
        let payer = Pubkey::new_unique();
        let create = create_payment_sol_instruction(
            &args(),
            &payer,
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
        );
        let tx = confirmed(&[create], &payer);
        assert!(has_payment_instruction(&tx));
        let data = extract_transfer_data(&tx).unwrap();
        assert_eq!(data.payer, payer);
        assert_eq!(data.variant, CreatePaymentVariant::Sol);
        assert_eq!(data.args, args());
    }

    #[test]
    fn extracts_base58_wrapped_inner_instruction() {
        let payer = Pubkey::new_unique();
        let message = MessageV0 {
            header: MessageHeader {
                num_required_signatures: 1,
                num_readonly_signed_accounts: 0,
                num_readonly_unsigned_accounts: 1,
            },
            account_keys: vec![payer, PAYMENT_PROGRAM_ID],
            recent_blockhash: Hash::default(),
            instructions: vec![],
            address_table_lookups: vec![],
        };
        let mut data = Vec::new();
        data.extend_from_slice(&crate::program::CREATE_PAYMENT_SOL_DISCRIMINATOR);
        data.extend_from_slice(&10_000u64.to_le_bytes());
        data.extend_from_slice(&[9u8; 32]);
        let tx = ConfirmedPaymentTransaction {
            transaction: VersionedTransaction {
                signatures: vec![Signature::default()],
                message: VersionedMessage::V0(message),
            },
            inner_instructions: vec![UiInnerInstructions {
                index: 0,
                instructions: vec![UiInstruction::Compiled(UiCompiledInstruction {
                    program_id_index: 1,
                    accounts: vec![0],
                    data: bs58::encode(&data).into_string(),
                    stack_height: Some(2),
                })],
            }],
        };
        assert!(has_payment_instruction(&tx));
        let extracted = extract_transfer_data(&tx).unwrap();
        assert_eq!(extracted.payer, payer);
        assert_eq!(extracted.args, args());
    }

    #[test]
    fn unrelated_transaction_has_no_payment() {
        let payer = Pubkey::new_unique();
        let tx = confirmed(&[memo_instruction("hi")], &payer);
        assert!(!has_payment_instruction(&tx));
        assert!(extract_transfer_data(&tx).is_none());
    }

    #[test]
    fn memo_signature_verifies_for_matching_amount() {
        let payer = Pubkey::new_unique();
        let ephemeral = Keypair::new();
        let signature = ephemeral.sign_message(b"10000");
        let memo = memo_instruction(&hex::encode(signature.as_ref()));
        let tx = confirmed(&[memo], &payer);
        assert!(verify_memo_signature(&tx, &ephemeral.pubkey(), "10000"));
        assert!(!verify_memo_signature(&tx, &ephemeral.pubkey(), "10001"));
        assert!(!verify_memo_signature(&tx, &Pubkey::new_unique(), "10000"));
    }

    #[test]
    fn missing_memo_fails_verification() {
        let payer = Pubkey::new_unique();
        let create = create_payment_sol_instruction(
            &args(),
            &payer,
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
        );
        let tx = confirmed(&[create], &payer);
        assert!(!verify_memo_signature(&tx, &Pubkey::new_unique(), "10000"));
    }

    #[test]
    fn garbage_memo_data_fails_verification() {
        let payer = Pubkey::new_unique();
        let tx = confirmed(&[memo_instruction("not hex at all")], &payer);
        assert!(!verify_memo_signature(&tx, &Pubkey::new_unique(), "10000"));
    }
}
