//! The blocking side of the wait group.
//!
//! A `WaitGroup` never blocks on its own state word. Observers that must wait
//! park on a [`WakeChannel`], and the caller that drives the counter to zero
//! releases the channel once per registered observer.

use auto_impl::auto_impl;
use parking_lot::{Condvar, Mutex};

/// A counting semaphore as seen by the wait group.
///
/// `release` must wake at most one caller blocked in `acquire`, and a release
/// that happens before the matching `acquire` must not be lost.
#[auto_impl(&, Arc)]
pub trait WakeChannel: Send + Sync {
    /// Blocks until a permit is available, then takes it.
    fn acquire(&self);

    /// Adds one permit, waking at most one blocked acquirer.
    fn release(&self);
}

/// Counting semaphore built on a mutex and a condition variable.
pub struct Semaphore {
    permits: Mutex<usize>,
    cond: Condvar,
}

impl Semaphore {
    pub fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits),
            cond: Condvar::new(),
        }
    }

    /// Number of permits released but not yet acquired.
    pub fn available(&self) -> usize {
        *self.permits.lock()
    }
}

impl Default for Semaphore {
    fn default() -> Self {
        Self::new(0)
    }
}

impl WakeChannel for Semaphore {
    fn acquire(&self) {
        let mut permits = self.permits.lock();
        while *permits == 0 {
            self.cond.wait(&mut permits);
        }
        *permits -= 1;
    }

    fn release(&self) {
        let mut permits = self.permits.lock();
        *permits += 1;
        self.cond.notify_one();
    }
}
