use thiserror::Error;

/// Misuse detected by [`WaitGroup::increment`](crate::WaitGroup::increment).
///
/// Both variants are programming errors. The wait group's state has already
/// been updated when they are returned, so the instance must not be used for
/// further cycles.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitGroupError {
    #[error("negative wait group counter: {counter} after adding {delta}")]
    NegativeCounter { counter: i64, delta: i32 },

    #[error("wait group counter overflow: {counter} after adding {delta}")]
    CounterOverflow { counter: i64, delta: i32 },
}

impl From<WaitGroupError> for String {
    fn from(error: WaitGroupError) -> Self {
        error.to_string()
    }
}
