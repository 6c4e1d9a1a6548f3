//! Background reconciliation of payments the gateway never called back about.

mod poller;

pub use poller::{ReconciliationPoller, ReconciliationPollerConfig, ReconciliationReport};
