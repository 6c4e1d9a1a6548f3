//! Payment ledger handlers.

mod cancel_payment;
mod check_payment;
mod create_payment;
mod reconcile_payment;
mod refund_payment;

pub use cancel_payment::{CancelPaymentCommand, CancelPaymentHandler, CancelPaymentResult};
pub use check_payment::{CheckPaymentHandler, CheckPaymentQuery};
pub use create_payment::{CreatePaymentCommand, CreatePaymentHandler};
pub use reconcile_payment::{
    ReconcilePaymentCommand, ReconcilePaymentHandler, ReconcilePaymentResult,
};
pub use refund_payment::{RefundPaymentCommand, RefundPaymentHandler, RefundPaymentResult};
