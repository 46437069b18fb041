use crate::def::SC;
use crate::error::WaitGroupError;
use crate::state::{delta_bits, StateSnapshot};
use crate::wake::{Semaphore, WakeChannel};
use std::fmt;
use std::sync::atomic::AtomicU64;

/// Waits for a dynamically sized set of workers to finish.
///
/// A producer registers outstanding work with [`increment`](Self::increment)
/// before starting the workers, each worker calls
/// [`decrement`](Self::decrement) when it is done, and any number of
/// observers call [`wait`](Self::wait) to block until the outstanding count
/// drops to zero.
///
/// The counter and the number of blocked observers share one atomic word and
/// are only changed through atomic add and compare-and-swap. Blocked
/// observers park on the [`WakeChannel`]; the `decrement` that brings the
/// counter to zero releases the channel exactly once per registered observer.
///
/// A wait group can be reused for another cycle once the counter is back at
/// zero and every observer released by the previous cycle has returned from
/// `wait`. Starting a new cycle before that point is not detected and its
/// outcome is unspecified.
///
/// If fewer `decrement`s happen than were registered, observers stay blocked
/// forever. This is not detected either.
pub struct WaitGroup<W: WakeChannel = Semaphore> {
    state: AtomicU64,
    wake: W,
}

impl WaitGroup<Semaphore> {
    pub fn new() -> Self {
        Self::with_wake_channel(Semaphore::new(0))
    }
}

impl Default for WaitGroup<Semaphore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: WakeChannel> WaitGroup<W> {
    /// Creates an idle wait group that parks observers on `wake`.
    ///
    /// `wake` must start without permits, otherwise the first observers would
    /// return before their release.
    pub fn with_wake_channel(wake: W) -> Self {
        Self {
            state: AtomicU64::new(0),
            wake,
        }
    }

    pub fn wake_channel(&self) -> &W {
        &self.wake
    }

    /// Adds `delta` to the outstanding-worker counter.
    ///
    /// When this call moves the counter from a positive value to exactly zero,
    /// every observer registered at that moment is released before it
    /// returns. The release loop never blocks.
    ///
    /// # Errors
    /// * `NegativeCounter` - the counter went below zero
    /// * `CounterOverflow` - the counter went past `i32::MAX`
    pub fn increment(&self, delta: i32) -> Result<(), WaitGroupError> {
        let bits = delta_bits(delta);
        let old = StateSnapshot::unpack(self.state.fetch_add(bits, SC));
        let counter = old.counter as i64 + delta as i64;
        if counter < 0 {
            return Err(WaitGroupError::NegativeCounter { counter, delta });
        }
        if counter > i32::MAX as i64 {
            return Err(WaitGroupError::CounterOverflow { counter, delta });
        }
        // the waiter half is unchanged by the add
        let waiters = old.waiters;
        if counter > 0 || waiters == 0 || old.counter == 0 {
            return Ok(());
        }
        // We drove the counter to zero, so no new observer can register until
        // the next cycle starts. The captured waiters are ours to release.
        self.reset_waiters(waiters);
        for _ in 0..waiters {
            self.wake.release();
        }
        Ok(())
    }

    /// Marks one worker as done. Same as `increment(-1)`.
    pub fn decrement(&self) -> Result<(), WaitGroupError> {
        self.increment(-1)
    }

    /// Blocks until the outstanding-worker counter is zero.
    ///
    /// Returns at once if the counter is already zero. Otherwise the caller
    /// registers itself as a waiter and parks until the `decrement` that
    /// reaches zero releases it.
    pub fn wait(&self) {
        loop {
            let word = self.state.load(SC);
            let curr = StateSnapshot::unpack(word);
            if curr.counter == 0 {
                return;
            }
            debug_assert!(curr.waiters < u32::MAX, "too many wait group waiters");
            if self
                .state
                .compare_exchange(word, word + 1, SC, SC)
                .is_ok()
            {
                self.wake.acquire();
                return;
            }
        }
    }

    /// Current counter and waiter count, taken from one atomic load.
    ///
    /// Other threads may change the state right after the load, so the
    /// result is only informational.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot::unpack(self.state.load(SC))
    }

    pub fn is_idle(&self) -> bool {
        self.snapshot().counter == 0
    }

    // Removes exactly the `waiters` captured at the zero crossing. Any
    // counter change made meanwhile by a new cycle is kept.
    fn reset_waiters(&self, waiters: u32) {
        let mut word = self.state.load(SC);
        loop {
            let curr = StateSnapshot::unpack(word);
            let next = StateSnapshot::new(curr.counter, curr.waiters.saturating_sub(waiters));
            match self.state.compare_exchange(word, next.pack(), SC, SC) {
                Ok(_) => return,
                Err(actual) => word = actual,
            }
        }
    }
}

impl<W: WakeChannel> fmt::Debug for WaitGroup<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snap = self.snapshot();
        f.debug_struct("WaitGroup")
            .field("counter", &snap.counter)
            .field("waiters", &snap.waiters)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_idle() {
        let wg = WaitGroup::new();
        assert!(wg.is_idle());
        assert_eq!(wg.snapshot(), StateSnapshot::new(0, 0));
        // nothing outstanding, must not block
        wg.wait();
        assert_eq!(wg.snapshot(), StateSnapshot::new(0, 0));
    }

    #[test]
    fn test_increment_and_decrement() {
        let wg = WaitGroup::new();
        wg.increment(3).unwrap();
        assert_eq!(wg.snapshot().counter, 3);
        assert!(!wg.is_idle());
        wg.decrement().unwrap();
        wg.increment(-2).unwrap();
        assert!(wg.is_idle());
        wg.increment(0).unwrap();
        assert_eq!(wg.snapshot(), StateSnapshot::new(0, 0));
    }

    #[test]
    fn test_decrement_without_increment() {
        let wg = WaitGroup::new();
        assert_eq!(
            wg.decrement(),
            Err(WaitGroupError::NegativeCounter {
                counter: -1,
                delta: -1
            })
        );
        assert_eq!(wg.snapshot().counter, -1);
    }

    #[test]
    fn test_negative_after_large_delta() {
        let wg = WaitGroup::new();
        wg.increment(2).unwrap();
        assert_eq!(
            wg.increment(-5),
            Err(WaitGroupError::NegativeCounter {
                counter: -3,
                delta: -5
            })
        );
    }

    #[test]
    fn test_counter_overflow() {
        let wg = WaitGroup::new();
        wg.increment(i32::MAX).unwrap();
        assert_eq!(
            wg.increment(1),
            Err(WaitGroupError::CounterOverflow {
                counter: i32::MAX as i64 + 1,
                delta: 1
            })
        );
    }

    #[test]
    fn test_fast_path_leaves_no_permits() {
        let wg = WaitGroup::new();
        wg.increment(1).unwrap();
        wg.decrement().unwrap();
        wg.wait();
        assert_eq!(wg.wake_channel().available(), 0);
        assert_eq!(wg.snapshot(), StateSnapshot::new(0, 0));
    }

    #[test]
    fn test_zero_crossing_releases_registered_waiters() {
        let wg = WaitGroup::new();
        wg.increment(1).unwrap();
        // simulate two registrations without parking the test thread
        wg.state.fetch_add(2, SC);
        assert_eq!(wg.snapshot(), StateSnapshot::new(1, 2));
        wg.decrement().unwrap();
        assert_eq!(wg.snapshot(), StateSnapshot::new(0, 0));
        assert_eq!(wg.wake_channel().available(), 2);
    }

    #[test]
    fn test_zero_delta_does_not_release() {
        let wg = WaitGroup::new();
        // waiters left over at counter zero, as seen mid-release
        wg.state.store(StateSnapshot::new(0, 3).pack(), SC);
        wg.increment(0).unwrap();
        assert_eq!(wg.wake_channel().available(), 0);
        assert_eq!(wg.snapshot(), StateSnapshot::new(0, 3));
    }

    #[test]
    fn test_reset_keeps_new_cycle_counter() {
        let wg = WaitGroup::new();
        wg.state.store(StateSnapshot::new(4, 3).pack(), SC);
        wg.reset_waiters(3);
        assert_eq!(wg.snapshot(), StateSnapshot::new(4, 0));
    }

    #[test]
    fn test_debug_output() {
        let wg = WaitGroup::new();
        wg.increment(2).unwrap();
        assert_eq!(format!("{:?}", wg), "WaitGroup { counter: 2, waiters: 0 }");
    }
}
