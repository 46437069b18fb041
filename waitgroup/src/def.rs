use std::sync::atomic::Ordering;

pub const SC: Ordering = Ordering::SeqCst;

// the packed state word: high 32 bits hold the signed counter,
// low 32 bits hold the waiter count
pub const COUNTER_SHIFT: u32 = 32;
pub const WAITER_MASK: u64 = (1u64 << COUNTER_SHIFT) - 1;
