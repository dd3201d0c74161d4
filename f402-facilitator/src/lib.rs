#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! x402 facilitator HTTP service.
//!
//! Routes settlement and requirement-augmentation requests across an
//! ordered set of [`f402::PaymentHandler`]s, fanning discovery operations
//! out concurrently and walking handlers in order for settlement.
//!
//! # Modules
//!
//! - [`dispatcher`] — Handler ordering, fan-out, and settlement walk
//! - [`fanout`] — Shared-deadline task joining
//! - [`handlers`] — Axum route handlers and router builder
//! - [`error`] — Facilitator service error types
//! - [`config`] — Server configuration with environment variable expansion

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod fanout;
pub mod handlers;

pub use dispatcher::{Dispatcher, Timeouts};
pub use handlers::{FacilitatorState, facilitator_router};
