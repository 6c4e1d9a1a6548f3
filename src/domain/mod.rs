//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `subscription` - Templates, issued subscriptions, and credit accounting
//! - `payment` - Payment lifecycle and refunds
//! - `redemption` - Visits and duplicate-scan guarding

pub mod foundation;
pub mod payment;
pub mod redemption;
pub mod subscription;
