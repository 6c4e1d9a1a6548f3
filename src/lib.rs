//! Visit Pass - Prepaid attendance subscriptions for partner locations
//!
//! Payers buy subscriptions from templates (a number of lessons, or
//! unlimited), pay through an external gateway, and redeem visits at
//! partner locations by scanning a token. Payments are reconciled against
//! the gateway by callback, by explicit check, and by a background poller.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
