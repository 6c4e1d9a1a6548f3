//! Subscription domain module.
//!
//! Templates, issued subscriptions, and their credit accounting.
//!
//! # Module Structure
//!
//! - `aggregate` - Subscription aggregate entity
//! - `status` - SubscriptionStatus state machine
//! - `tariff` - Credit policy (finite lessons or unlimited)
//! - `template` - Sellable subscription template
//! - `token` - Opaque redemption token

mod aggregate;
mod errors;
mod status;
mod tariff;
mod template;
mod token;

pub use aggregate::{CreditRedemption, Subscription};
pub use errors::SubscriptionError;
pub use status::SubscriptionStatus;
pub use tariff::Tariff;
pub use template::SubscriptionTemplate;
pub use token::RedemptionToken;
