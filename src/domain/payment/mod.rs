//! Payment domain module.
//!
//! Payments collected through the external gateway, and refunds against them.
//!
//! # Module Structure
//!
//! - `aggregate` - Payment aggregate entity
//! - `status` - PaymentStatus state machine
//! - `refund` - PaymentRefund records and balance arithmetic

mod aggregate;
mod errors;
mod refund;
mod status;

pub use aggregate::Payment;
pub use errors::PaymentError;
pub use refund::{refundable_balance, PaymentRefund, RefundStatus};
pub use status::PaymentStatus;
