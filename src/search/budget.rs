use std::time::{Duration, Instant};

/// Anything the search can poll for "keep going?".
///
/// Polls happen before every root move trial and at every recursion entry, so
/// implementations must be cheap.
pub trait Budget {
    fn remaining(&self) -> bool;
}

/// Wall-clock deadline.
#[derive(Debug, Clone, Copy)]
pub struct TimeBudget {
    deadline: Instant,
}

impl TimeBudget {
    /// Start the clock: the budget expires `limit` from now.
    pub fn start(limit: Duration) -> Self {
        let now = Instant::now();
        // An unrepresentable deadline is as good as no deadline.
        let deadline = now.checked_add(limit).unwrap_or(now + Duration::from_secs(86_400 * 365));
        Self { deadline }
    }

    /// A budget that is already spent.
    pub fn expired() -> Self { Self { deadline: Instant::now() } }
}

impl Budget for TimeBudget {
    #[inline]
    fn remaining(&self) -> bool { Instant::now() < self.deadline }
}

impl<B: Budget + ?Sized> Budget for &B {
    #[inline]
    fn remaining(&self) -> bool { (**self).remaining() }
}
