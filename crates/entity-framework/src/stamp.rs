//! # Delivery Stamps
//!
//! REST results and Gateway dispatches for the same id race each other. Every
//! model entering the cache carries a [`Stamp`] taken from the client's
//! [`StampClock`] when the model was *issued*: at dispatch receipt for Gateway
//! events, at request time for REST calls. A fold is applied only if its stamp is
//! newer than the entity's, so the last-issued model wins even when an older fetch
//! completes late.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic marker of when a model was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Stamp(u64);

impl Stamp {
    /// Older than every issued stamp. Used by detached entities.
    pub const ZERO: Stamp = Stamp(0);

    pub fn get(self) -> u64 {
        self.0
    }

    /// The next stamp after this one, for entities that no longer have a clock.
    pub fn successor(self) -> Stamp {
        Stamp(self.0.saturating_add(1))
    }
}

/// Issues strictly increasing stamps. One per client.
#[derive(Debug, Default)]
pub struct StampClock {
    last: AtomicU64,
}

impl StampClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Stamp {
        Stamp(self.last.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// The most recently issued stamp.
    pub fn current(&self) -> Stamp {
        Stamp(self.last.load(Ordering::SeqCst))
    }
}

/// A model together with the stamp it was issued under.
#[derive(Debug, Clone, PartialEq)]
pub struct Stamped<M> {
    pub stamp: Stamp,
    pub model: M,
}

impl<M> Stamped<M> {
    pub fn new(stamp: Stamp, model: M) -> Self {
        Self { stamp, model }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_is_strictly_increasing() {
        let clock = StampClock::new();
        let first = clock.issue();
        let second = clock.issue();
        assert!(Stamp::ZERO < first);
        assert!(first < second);
        assert_eq!(clock.current(), second);
    }
}
