#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Solana settlement support for the x402 payment protocol.
//!
//! Implements the `x-solana-settlement` scheme: clients escrow a payment
//! with an on-chain payment program, and a facilitator verifies the escrow
//! transaction and releases it with its settlement authority.
//!
//! # Modules
//!
//! - [`settlement`] - The facilitator-side [`f402::PaymentHandler`]
//! - [`client`] - Client-side payment construction over a [`client::Wallet`]
//! - [`program`] - The on-chain program's binary interface
//! - [`chain`] - RPC provider abstraction
//! - [`networks`] - Well-known clusters and token deployments

pub mod chain;
pub mod client;
pub mod networks;
pub mod program;
pub mod settlement;

pub use chain::{RpcSettlementProvider, SettlementProvider};
pub use networks::KnownCluster;
pub use settlement::{SolanaSettlementHandler, X402_SCHEME};
