#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the x402 payment protocol.
//!
//! This crate provides the foundational types shared between payment handlers,
//! facilitators, and clients in an x402 deployment. It is chain-agnostic:
//! chain-specific settlement logic lives in separate crates (e.g. `f402-svm`
//! for Solana-style networks).
//!
//! # Overview
//!
//! The x402 protocol enables pay-per-request flows over HTTP. A resource
//! server publishes [`proto::PaymentRequirements`]; a client answers with a
//! [`proto::PaymentPayload`] carrying proof of payment; a facilitator routes
//! that proof to the matching [`handler::PaymentHandler`], which verifies and
//! settles it on-chain and reports a [`proto::SettleResponse`].
//!
//! # Modules
//!
//! - [`proto`] - Wire format types
//! - [`handler`] - The payment handler contract implemented per (network, asset)
//! - [`encoding`] - Base64 payment header encoding
//! - [`error`] - Protocol-level error taxonomy

pub mod encoding;
pub mod error;
pub mod handler;
pub mod proto;

pub use error::{HandlerError, ProtocolError};
pub use handler::{BoxFuture, PaymentHandler, SettleOutcome};
pub use proto::{
    PaymentPayload, PaymentRequired, PaymentRequirements, SettleRequest, SettleResponse,
    SupportedKind, SupportedResponse,
};
