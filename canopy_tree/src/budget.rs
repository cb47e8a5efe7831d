// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cooperative budgets polled by long-running passes.
//!
//! Passes such as [`BoundsCache::refresh`](crate::BoundsCache::refresh) poll their budget once
//! per node and return early, in a consistent state, once it is exhausted.
//! Nothing is preempted; cancellation is entirely up to the polling loop.

use core::cell::Cell;

#[cfg(feature = "std")]
use core::time::Duration;
#[cfg(feature = "std")]
use web_time::Instant;

/// Something a pass can poll to learn whether it must stop.
pub trait Budget {
    /// True once no more work should be started.
    fn exhausted(&self) -> bool;
}

impl<B: Budget + ?Sized> Budget for &B {
    fn exhausted(&self) -> bool {
        (**self).exhausted()
    }
}

/// A budget that never runs out.
#[derive(Copy, Clone, Debug, Default)]
pub struct Unbounded;

impl Budget for Unbounded {
    fn exhausted(&self) -> bool {
        false
    }
}

/// A budget that allows a fixed number of polls.
///
/// Each poll consumes one unit; the poll that finds zero units left reports exhaustion.
/// Useful for deterministic cancellation in tests and for work caps that do not depend on
/// wall-clock time.
#[derive(Clone, Debug)]
pub struct PollLimit {
    remaining: Cell<usize>,
}

impl PollLimit {
    /// Allow `polls` successful polls.
    pub fn new(polls: usize) -> Self {
        Self {
            remaining: Cell::new(polls),
        }
    }

    /// Polls still available.
    pub fn remaining(&self) -> usize {
        self.remaining.get()
    }
}

impl Budget for PollLimit {
    fn exhausted(&self) -> bool {
        match self.remaining.get() {
            0 => true,
            n => {
                self.remaining.set(n - 1);
                false
            }
        }
    }
}

/// A wall-clock instant after which work must stop.
///
/// Computed once at the start of a frame and shared, read-only, by every stage.
#[cfg(feature = "std")]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline {
    at: Instant,
}

#[cfg(feature = "std")]
impl Deadline {
    /// A deadline at `at`.
    pub fn at(at: Instant) -> Self {
        Self { at }
    }

    /// A deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    /// The instant itself.
    pub fn instant(&self) -> Instant {
        self.at
    }

    /// Time left before the deadline, zero if it has passed.
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// True once the deadline has passed.
    pub fn is_past(&self) -> bool {
        Instant::now() >= self.at
    }
}

#[cfg(feature = "std")]
impl Budget for Deadline {
    fn exhausted(&self) -> bool {
        self.is_past()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_limit_counts_down() {
        let b = PollLimit::new(2);
        assert!(!b.exhausted());
        assert!(!b.exhausted());
        assert!(b.exhausted());
        assert!(b.exhausted(), "stays exhausted");
        assert_eq!(b.remaining(), 0);
    }

    #[test]
    fn references_are_budgets() {
        fn takes<B: Budget>(b: B) -> bool {
            b.exhausted()
        }
        let b = PollLimit::new(0);
        assert!(takes(&b));
        assert!(!takes(Unbounded));
    }

    #[cfg(feature = "std")]
    #[test]
    fn deadline_in_the_past_is_exhausted() {
        let d = Deadline::after(Duration::ZERO);
        assert!(d.exhausted());
        assert_eq!(d.remaining(), Duration::ZERO);
        let far = Deadline::after(Duration::from_secs(3600));
        assert!(!far.exhausted());
        assert!(far > d);
    }
}
