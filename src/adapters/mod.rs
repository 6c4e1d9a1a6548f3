//! Adapters - Implementations of port interfaces.
//!
//! - `gateway` - Payment provider client, mock, and callback verification
//! - `http` - axum REST API
//! - `memory` - In-memory stores and a manual clock
//! - `postgres` - PostgreSQL stores
//! - `reconciliation` - Background poller for unsettled payments

pub mod gateway;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod reconciliation;

pub use gateway::{CallbackVerifier, HttpPaymentGateway, MockPaymentGateway};
pub use reconciliation::{ReconciliationPoller, ReconciliationPollerConfig, ReconciliationReport};
