//! Bounded polling for host conditions that have no completion event.
//!
//! Policy: poll at a fixed interval and, once the ceiling is reached, report
//! [`WaitOutcome::TimedOut`] so the caller proceeds. Never hangs, never retries.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Satisfied,
    TimedOut,
}

/// Sleep `poll_interval`, then check `predicate`; repeat until it holds or
/// `timeout` has elapsed in total.
pub async fn await_condition<F>(
    mut predicate: F,
    poll_interval: Duration,
    timeout: Duration,
) -> WaitOutcome
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        tokio::time::sleep(poll_interval).await;
        if predicate() {
            return WaitOutcome::Satisfied;
        }
        if tokio::time::Instant::now() >= deadline {
            return WaitOutcome::TimedOut;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test(start_paused = true)]
    async fn satisfied_after_a_few_polls() {
        let polls = Cell::new(0);
        let outcome = await_condition(
            || {
                polls.set(polls.get() + 1);
                polls.get() >= 3
            },
            Duration::from_millis(100),
            Duration::from_secs(20),
        )
        .await;
        assert_eq!(outcome, WaitOutcome::Satisfied);
        assert_eq!(polls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_at_ceiling() {
        let start = tokio::time::Instant::now();
        let polls = Cell::new(0u32);
        let outcome = await_condition(
            || {
                polls.set(polls.get() + 1);
                false
            },
            Duration::from_millis(100),
            Duration::from_secs(20),
        )
        .await;
        assert_eq!(outcome, WaitOutcome::TimedOut);
        assert!(polls.get() > 100);
        assert!(start.elapsed() >= Duration::from_secs(20));
        assert!(start.elapsed() < Duration::from_secs(21));
    }

    #[tokio::test(start_paused = true)]
    async fn already_true_still_waits_one_interval() {
        let start = tokio::time::Instant::now();
        let outcome =
            await_condition(|| true, Duration::from_millis(100), Duration::from_secs(1)).await;
        assert_eq!(outcome, WaitOutcome::Satisfied);
        assert!(start.elapsed() >= Duration::from_millis(100));
        assert!(start.elapsed() < Duration::from_millis(200));
    }
}
