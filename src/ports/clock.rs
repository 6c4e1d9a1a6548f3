//! Time source port.

use crate::domain::foundation::Timestamp;

/// Abstraction over the wall clock so duplicate windows and poller ages can
/// be tested deterministically.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> Timestamp;
}

/// Production clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}
