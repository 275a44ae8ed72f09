use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag for simulation runs.
///
/// Clone the token into whatever owns the request lifecycle and call
/// [`CancelToken::cancel`] when the inputs become stale; the simulator checks
/// the flag once per simulated month and fails with
/// [`crate::DebtPayoffError::Cancelled`]. The loop is bounded by the month
/// cap either way, so cancellation is an efficiency concern only.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
