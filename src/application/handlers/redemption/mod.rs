//! Redemption handlers.

mod redeem_visit;

pub use redeem_visit::{RedeemVisitCommand, RedeemVisitHandler, RedeemVisitResult};
