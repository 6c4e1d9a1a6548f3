//! Redemption domain module.
//!
//! Visits recorded when a code is scanned at a location, and the duplicate
//! scan window that guards them.

mod errors;
mod visit;

pub use errors::RedemptionError;
pub use visit::{DuplicateWindow, Visit};
