//! Application layer: checkout, payment orchestration and the state they
//! share per payment id.
//!
//! `PaymentGateway` is the entry point. It wires a `CheckoutEngine` and a
//! `PaymentOrchestrator` to one `RetryLedger`, so a checkout retried after a
//! failed payment sees the instruments that payment declined.

pub mod cache;
pub mod checkout;
pub mod gateway;
pub mod ledger;
pub mod locks;
pub mod orchestrator;
