//! Packing of the wait group's two counters into one 64-bit word.
//!
//! The outstanding-worker counter and the waiter count must be observed and
//! mutated together, so both live in a single `AtomicU64`:
//!
//! ```text
//!  63                32 31                 0
//! +--------------------+--------------------+
//! |   counter (i32)    |   waiters (u32)    |
//! +--------------------+--------------------+
//! ```
//!
//! Adding `delta_bits(d)` to the word with a wrapping add changes the counter
//! by `d` and leaves the waiter half untouched. Adding `1` registers a waiter.

use crate::def::{COUNTER_SHIFT, WAITER_MASK};

/// A decoded view of the packed state word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateSnapshot {
    /// Outstanding workers
    pub counter: i32,
    /// Observers registered in `wait` and not yet released
    pub waiters: u32,
}

impl StateSnapshot {
    pub fn new(counter: i32, waiters: u32) -> Self {
        Self { counter, waiters }
    }

    pub fn pack(&self) -> u64 {
        ((self.counter as u32 as u64) << COUNTER_SHIFT) | self.waiters as u64
    }

    pub fn unpack(word: u64) -> Self {
        Self {
            counter: (word >> COUNTER_SHIFT) as u32 as i32,
            waiters: (word & WAITER_MASK) as u32,
        }
    }
}

/// Encodes a signed counter delta so that it can be applied with a single
/// wrapping `fetch_add` on the packed word.
pub fn delta_bits(delta: i32) -> u64 {
    (delta as i64 as u64) << COUNTER_SHIFT
}
