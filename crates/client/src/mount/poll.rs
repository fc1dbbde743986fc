//! Bounded fixed-interval polling.

use std::time::Duration;

/// Result of a bounded poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Polled<T> {
    /// The probe produced a value on `tick` (1-based).
    Found { value: T, tick: u32 },
    /// Every tick of the budget ran without a value.
    AbsentAfterBudget,
}

impl<T> Polled<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Polled::Found { .. })
    }
}

/// Probe on each tick until it yields a value or `budget` ticks have run.
///
/// Tick `k` fires at `k * interval` after the call. The first probe is not
/// immediate. Polling stops on the first value and never runs past the budget.
pub async fn poll_until<T, F>(interval: Duration, budget: u32, mut probe: F) -> Polled<T>
where
    F: FnMut(u32) -> Option<T>,
{
    for tick in 1..=budget {
        tokio::time::sleep(interval).await;
        if let Some(value) = probe(tick) {
            return Polled::Found { value, tick };
        }
    }

    Polled::AbsentAfterBudget
}
