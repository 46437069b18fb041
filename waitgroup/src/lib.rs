//! # Wait group
//!
//! A counting rendezvous for fan-out / fan-in work. A producer announces how
//! many workers are outstanding, every worker reports completion, and any
//! number of observer threads block until all of them have reported.
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//! use waitgroup::WaitGroup;
//!
//! let wg = Arc::new(WaitGroup::new());
//! wg.increment(4).unwrap();
//! for _ in 0..4 {
//!     let wg = wg.clone();
//!     thread::spawn(move || {
//!         // ... do some work ...
//!         wg.decrement().unwrap();
//!     });
//! }
//! wg.wait();
//! assert!(wg.is_idle());
//! ```
//!
//! The outstanding-worker counter and the number of blocked observers are
//! packed into one `AtomicU64` (see [`state`]) and only change through atomic
//! add and compare-and-swap, so `increment` and `decrement` never take a lock
//! and never block. Observers that have to wait park on a [`WakeChannel`],
//! which is a plain counting semaphore. [`Semaphore`] is the default one; any
//! other implementation can be injected with [`WaitGroup::with_wake_channel`].
//!
//! Calling `decrement` more times than work was registered is reported as
//! [`WaitGroupError::NegativeCounter`]. Registering more work than will ever
//! complete is not detected: observers simply stay blocked.

pub mod def;
pub mod error;
pub mod state;
pub mod wake;
mod waitgroup;

pub use error::WaitGroupError;
pub use state::StateSnapshot;
pub use wake::{Semaphore, WakeChannel};
pub use waitgroup::WaitGroup;
