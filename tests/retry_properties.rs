//! Property-based tests for retry scheduling invariants

use proptest::prelude::*;
use rebound::{backoff, RetryPolicy, RetryScheduler};
use std::cell::RefCell;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
struct Failure(u32);

#[derive(Debug, Default)]
struct Trace {
    supplier_calls: Vec<u32>,
    backoff_calls: Vec<(u32, u32)>,
}

/// Runs a scheduler with `max_attempts` against a supplier that succeeds on
/// `succeed_on` (never, if `None`), recording every call.
fn run_traced(max_attempts: u32, succeed_on: Option<u32>) -> (Result<u32, Failure>, Trace) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap();

    let trace = RefCell::new(Trace::default());
    let scheduler = RetryScheduler::new(RetryPolicy::new(max_attempts).unwrap());

    let result = runtime.block_on(scheduler.run(
        |attempt| {
            trace.borrow_mut().supplier_calls.push(attempt);
            async move {
                if Some(attempt) == succeed_on {
                    Ok(attempt * 10)
                } else {
                    Err(Failure(attempt))
                }
            }
        },
        backoff::from_fn(|attempt, err: &Failure| {
            trace.borrow_mut().backoff_calls.push((attempt, err.0));
            Duration::from_millis(u64::from(attempt))
        }),
    ));

    (result, trace.into_inner())
}

proptest! {
    #[test]
    fn prop_exhaustion_uses_every_attempt(max_attempts in 1u32..40) {
        let (result, trace) = run_traced(max_attempts, None);

        prop_assert_eq!(result, Err(Failure(max_attempts)));
        prop_assert_eq!(trace.supplier_calls, (1..=max_attempts).collect::<Vec<_>>());
        prop_assert_eq!(
            trace.backoff_calls,
            (1..max_attempts).map(|i| (i, i)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn prop_success_stops_retrying(max_attempts in 1u32..40, succeed_on in 1u32..40) {
        prop_assume!(succeed_on <= max_attempts);

        let (result, trace) = run_traced(max_attempts, Some(succeed_on));

        prop_assert_eq!(result, Ok(succeed_on * 10));
        prop_assert_eq!(trace.supplier_calls.len() as u32, succeed_on);
        prop_assert_eq!(trace.backoff_calls.len() as u32, succeed_on - 1);
    }

    #[test]
    fn prop_success_after_budget_is_never_reached(max_attempts in 1u32..20, extra in 1u32..20) {
        let (result, trace) = run_traced(max_attempts, Some(max_attempts + extra));

        prop_assert_eq!(result, Err(Failure(max_attempts)));
        prop_assert_eq!(trace.supplier_calls.len() as u32, max_attempts);
    }

    #[test]
    fn prop_backoff_indices_strictly_increase(max_attempts in 2u32..40) {
        let (_, trace) = run_traced(max_attempts, None);

        let indices: Vec<u32> = trace.backoff_calls.iter().map(|(i, _)| *i).collect();
        prop_assert!(indices.windows(2).all(|w| w[1] == w[0] + 1));
        prop_assert_eq!(indices.first().copied(), Some(1));
    }
}

#[test]
fn test_large_attempt_budget_does_not_grow_the_stack() {
    let (result, trace) = run_traced(10_000, Some(10_000));

    assert_eq!(result, Ok(100_000));
    assert_eq!(trace.backoff_calls.len(), 9_999);
}
