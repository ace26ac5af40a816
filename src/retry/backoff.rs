//! Backoff functions: how long to wait after a failed attempt.
//!
//! A [`Backoff`] is consulted once for every failed attempt that will be
//! followed by another one. It receives the 1-indexed number of the attempt
//! that just failed and a reference to its error, and yields the delay before
//! the next attempt. It may also fail, which aborts the run.
//!
//! Closures are adapted with [`from_fn`], [`try_from_fn`] and [`from_async`].
//! A plain [`Duration`] is a constant backoff, and [`DelayStrategy`] covers
//! the usual constant/linear/exponential/Fibonacci schedules.
//!
//! # Examples
//!
//! ```rust
//! use rebound::backoff::{self, Backoff};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let mut squares = backoff::from_fn(|attempt, _err: &String| {
//!     Duration::from_millis(u64::from(attempt * attempt) * 4)
//! });
//!
//! let delay = squares.backoff(3, &"bad future 3".to_string()).await;
//! assert_eq!(delay, Ok(Duration::from_millis(36)));
//! # });
//! ```

use std::future::{ready, Future};
use std::time::Duration;

/// Computes the delay between a failed attempt and the next one.
pub trait Backoff<E> {
    /// Delay to wait after attempt `attempt` (1-indexed) failed with `error`.
    ///
    /// Returning `Err` stops the run; the error becomes its terminal outcome.
    fn backoff(
        &mut self,
        attempt: u32,
        error: &E,
    ) -> impl Future<Output = Result<Duration, E>> + Send;
}

impl<E, B> Backoff<E> for &mut B
where
    B: Backoff<E> + ?Sized,
{
    fn backoff(
        &mut self,
        attempt: u32,
        error: &E,
    ) -> impl Future<Output = Result<Duration, E>> + Send {
        (**self).backoff(attempt, error)
    }
}

/// Every retry waits the same duration.
impl<E: Send> Backoff<E> for Duration {
    fn backoff(
        &mut self,
        _attempt: u32,
        _error: &E,
    ) -> impl Future<Output = Result<Duration, E>> + Send {
        ready(Ok(*self))
    }
}

/// Backoff built from an infallible, synchronous closure.
///
/// Created by [`from_fn`].
#[derive(Clone)]
pub struct FromFn<F> {
    f: F,
}

/// Adapt `|attempt, &error| -> Duration` into a [`Backoff`].
pub fn from_fn<E, F>(f: F) -> FromFn<F>
where
    F: FnMut(u32, &E) -> Duration,
{
    FromFn { f }
}

impl<E, F> Backoff<E> for FromFn<F>
where
    E: Send,
    F: FnMut(u32, &E) -> Duration,
{
    fn backoff(
        &mut self,
        attempt: u32,
        error: &E,
    ) -> impl Future<Output = Result<Duration, E>> + Send {
        ready(Ok((self.f)(attempt, error)))
    }
}

impl<F> std::fmt::Debug for FromFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FromFn").finish_non_exhaustive()
    }
}

/// Backoff built from a fallible, synchronous closure.
///
/// Created by [`try_from_fn`].
#[derive(Clone)]
pub struct TryFromFn<F> {
    f: F,
}

/// Adapt `|attempt, &error| -> Result<Duration, E>` into a [`Backoff`].
///
/// # Examples
///
/// ```rust
/// use rebound::{backoff, retry};
/// use std::num::NonZeroU32;
///
/// # tokio_test::block_on(async {
/// let result = retry(
///     |attempt| async move { Err::<(), _>(format!("bad future {}", attempt)) },
///     NonZeroU32::new(5).unwrap(),
///     backoff::try_from_fn(|_attempt, _err: &String| Err("no delay available".to_string())),
/// )
/// .await;
///
/// // The backoff's error ends the run right after the first attempt.
/// assert_eq!(result, Err("no delay available".to_string()));
/// # });
/// ```
pub fn try_from_fn<E, F>(f: F) -> TryFromFn<F>
where
    F: FnMut(u32, &E) -> Result<Duration, E>,
{
    TryFromFn { f }
}

impl<E, F> Backoff<E> for TryFromFn<F>
where
    E: Send,
    F: FnMut(u32, &E) -> Result<Duration, E>,
{
    fn backoff(
        &mut self,
        attempt: u32,
        error: &E,
    ) -> impl Future<Output = Result<Duration, E>> + Send {
        ready((self.f)(attempt, error))
    }
}

impl<F> std::fmt::Debug for TryFromFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TryFromFn").finish_non_exhaustive()
    }
}

/// Backoff built from a closure returning a future.
///
/// Created by [`from_async`].
#[derive(Clone)]
pub struct FromAsync<F> {
    f: F,
}

/// Adapt `|attempt, &error| -> impl Future<Output = Result<Duration, E>>` into
/// a [`Backoff`].
///
/// The returned future is awaited before the delay itself starts, so the run
/// stays suspended for both. It cannot borrow the error; copy out whatever it
/// needs.
pub fn from_async<E, F, Fut>(f: F) -> FromAsync<F>
where
    F: FnMut(u32, &E) -> Fut,
    Fut: Future<Output = Result<Duration, E>> + Send,
{
    FromAsync { f }
}

impl<E, F, Fut> Backoff<E> for FromAsync<F>
where
    F: FnMut(u32, &E) -> Fut,
    Fut: Future<Output = Result<Duration, E>> + Send,
{
    fn backoff(
        &mut self,
        attempt: u32,
        error: &E,
    ) -> impl Future<Output = Result<Duration, E>> + Send {
        (self.f)(attempt, error)
    }
}

impl<F> std::fmt::Debug for FromAsync<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FromAsync").finish_non_exhaustive()
    }
}

/// A precomputed delay schedule.
///
/// Strategies are pure data. Delays are derived only from the index of the
/// failed attempt, so the same strategy always yields the same schedule.
///
/// # Examples
///
/// ```rust
/// use rebound::DelayStrategy;
/// use std::time::Duration;
///
/// let strategy = DelayStrategy::exponential(Duration::from_millis(100))
///     .with_max_delay(Duration::from_millis(500));
///
/// assert_eq!(strategy.delay_for_attempt(1), Duration::from_millis(100));
/// assert_eq!(strategy.delay_for_attempt(3), Duration::from_millis(400));
/// assert_eq!(strategy.delay_for_attempt(4), Duration::from_millis(500)); // capped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayStrategy {
    kind: DelayKind,
    max_delay: Option<Duration>,
}

/// How a [`DelayStrategy`] grows with each failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayKind {
    /// Fixed delay after every failure.
    Constant(Duration),
    /// Delay grows linearly: base * attempt.
    Linear {
        /// Base delay duration.
        base: Duration,
    },
    /// Delay doubles: base * 2^(attempt - 1).
    Exponential {
        /// Base delay duration.
        base: Duration,
    },
    /// Delay follows the Fibonacci sequence: base * fib(attempt).
    Fibonacci {
        /// Base delay duration.
        base: Duration,
    },
}

impl DelayStrategy {
    /// Wait `delay` after every failed attempt.
    pub fn constant(delay: Duration) -> Self {
        Self::from_kind(DelayKind::Constant(delay))
    }

    /// Wait `base`, `2 * base`, `3 * base`, ...
    pub fn linear(base: Duration) -> Self {
        Self::from_kind(DelayKind::Linear { base })
    }

    /// Wait `base`, `2 * base`, `4 * base`, ...
    pub fn exponential(base: Duration) -> Self {
        Self::from_kind(DelayKind::Exponential { base })
    }

    /// Wait `base`, `base`, `2 * base`, `3 * base`, `5 * base`, ...
    pub fn fibonacci(base: Duration) -> Self {
        Self::from_kind(DelayKind::Fibonacci { base })
    }

    fn from_kind(kind: DelayKind) -> Self {
        Self {
            kind,
            max_delay: None,
        }
    }

    /// Cap every delay at `max`.
    pub fn with_max_delay(mut self, max: Duration) -> Self {
        self.max_delay = Some(max);
        self
    }

    /// Get the growth kind.
    pub fn kind(&self) -> &DelayKind {
        &self.kind
    }

    /// Get the maximum delay cap.
    pub fn max_delay(&self) -> Option<Duration> {
        self.max_delay
    }

    /// Delay after attempt `attempt` (1-indexed) failed.
    ///
    /// A delay too large to represent saturates at [`Duration::MAX`] (before
    /// the `max_delay` cap applies). A zero base always yields zero.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = match self.kind {
            DelayKind::Constant(d) => d,
            DelayKind::Linear { base } => base.saturating_mul(attempt),
            DelayKind::Exponential { base } => {
                scale(base, 2u32.checked_pow(attempt.saturating_sub(1)))
            }
            DelayKind::Fibonacci { base } => scale(base, fibonacci(attempt)),
        };

        match self.max_delay {
            Some(max) => delay.min(max),
            None => delay,
        }
    }
}

impl<E: Send> Backoff<E> for DelayStrategy {
    fn backoff(
        &mut self,
        attempt: u32,
        _error: &E,
    ) -> impl Future<Output = Result<Duration, E>> + Send {
        ready(Ok(self.delay_for_attempt(attempt)))
    }
}

/// `base * factor`, where a `None` factor has already overflowed.
fn scale(base: Duration, factor: Option<u32>) -> Duration {
    if base.is_zero() {
        return Duration::ZERO;
    }
    factor
        .and_then(|factor| base.checked_mul(factor))
        .unwrap_or(Duration::MAX)
}

/// Calculate the nth Fibonacci number, or `None` once it no longer fits a `u32`.
fn fibonacci(n: u32) -> Option<u32> {
    if n == 0 {
        return Some(0);
    }
    let mut a = 0u32;
    let mut b = 1u32;
    for _ in 1..n {
        let next = a.checked_add(b)?;
        a = b;
        b = next;
    }
    Some(b)
}

#[cfg(test)]
mod backoff_tests {
    use super::*;

    #[test]
    fn test_constant_delay() {
        let strategy = DelayStrategy::constant(Duration::from_millis(20));
        for attempt in 1..5 {
            assert_eq!(
                strategy.delay_for_attempt(attempt),
                Duration::from_millis(20)
            );
        }
    }

    #[test]
    fn test_linear_delay() {
        let strategy = DelayStrategy::linear(Duration::from_millis(7));

        assert_eq!(strategy.delay_for_attempt(1), Duration::from_millis(7));
        assert_eq!(strategy.delay_for_attempt(2), Duration::from_millis(14));
        assert_eq!(strategy.delay_for_attempt(3), Duration::from_millis(21));
    }

    #[test]
    fn test_exponential_delay() {
        let strategy = DelayStrategy::exponential(Duration::from_millis(100));

        assert_eq!(strategy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(strategy.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(strategy.delay_for_attempt(3), Duration::from_millis(400));
        assert_eq!(strategy.delay_for_attempt(4), Duration::from_millis(800));
    }

    #[test]
    fn test_fibonacci_delay() {
        let strategy = DelayStrategy::fibonacci(Duration::from_millis(100));

        assert_eq!(strategy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(strategy.delay_for_attempt(2), Duration::from_millis(100));
        assert_eq!(strategy.delay_for_attempt(3), Duration::from_millis(200));
        assert_eq!(strategy.delay_for_attempt(4), Duration::from_millis(300));
        assert_eq!(strategy.delay_for_attempt(5), Duration::from_millis(500));
    }

    #[test]
    fn test_max_delay_cap() {
        let strategy = DelayStrategy::linear(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(250));

        assert_eq!(strategy.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(strategy.delay_for_attempt(3), Duration::from_millis(250));
        assert_eq!(strategy.max_delay(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_exponential_saturates() {
        let strategy = DelayStrategy::exponential(Duration::from_secs(1));

        // 2^31 still fits the factor, 2^32 does not.
        assert_eq!(
            strategy.delay_for_attempt(32),
            Duration::from_secs(1 << 31)
        );
        assert_eq!(strategy.delay_for_attempt(33), Duration::MAX);
        assert_eq!(strategy.delay_for_attempt(u32::MAX), Duration::MAX);
    }

    #[test]
    fn test_exponential_saturation_respects_cap() {
        let strategy = DelayStrategy::exponential(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(30));
        assert_eq!(
            strategy.delay_for_attempt(u32::MAX),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_fibonacci_saturates() {
        let strategy = DelayStrategy::fibonacci(Duration::from_millis(1));
        assert_eq!(strategy.delay_for_attempt(1_000), Duration::MAX);
    }

    #[test]
    fn test_zero_base_never_saturates() {
        let exponential = DelayStrategy::exponential(Duration::ZERO);
        let fib = DelayStrategy::fibonacci(Duration::ZERO);
        assert_eq!(exponential.delay_for_attempt(u32::MAX), Duration::ZERO);
        assert_eq!(fib.delay_for_attempt(u32::MAX), Duration::ZERO);
    }

    #[test]
    fn test_fibonacci_function() {
        assert_eq!(fibonacci(0), Some(0));
        assert_eq!(fibonacci(1), Some(1));
        assert_eq!(fibonacci(2), Some(1));
        assert_eq!(fibonacci(3), Some(2));
        assert_eq!(fibonacci(4), Some(3));
        assert_eq!(fibonacci(5), Some(5));
        assert_eq!(fibonacci(6), Some(8));
        assert_eq!(fibonacci(47), Some(2_971_215_073));
        assert_eq!(fibonacci(48), None);
    }

    #[tokio::test]
    async fn test_duration_is_constant_backoff() {
        let mut delay = Duration::from_millis(20);
        let result = Backoff::<String>::backoff(&mut delay, 3, &"boom".to_string()).await;
        assert_eq!(result, Ok(Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn test_from_fn_sees_attempt_and_error() {
        let mut seen = Vec::new();
        {
            let mut backoff = from_fn(|attempt, err: &String| {
                seen.push((attempt, err.clone()));
                Duration::from_millis(u64::from(attempt))
            });
            assert_eq!(
                backoff.backoff(1, &"bad future 1".to_string()).await,
                Ok(Duration::from_millis(1))
            );
            assert_eq!(
                backoff.backoff(2, &"bad future 2".to_string()).await,
                Ok(Duration::from_millis(2))
            );
        }
        assert_eq!(
            seen,
            vec![
                (1, "bad future 1".to_string()),
                (2, "bad future 2".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_try_from_fn_propagates_error() {
        let mut backoff = try_from_fn(|attempt, _err: &String| {
            if attempt < 2 {
                Ok(Duration::ZERO)
            } else {
                Err("backoff refused".to_string())
            }
        });

        assert_eq!(
            backoff.backoff(1, &"x".to_string()).await,
            Ok(Duration::ZERO)
        );
        assert_eq!(
            backoff.backoff(2, &"x".to_string()).await,
            Err("backoff refused".to_string())
        );
    }

    #[tokio::test]
    async fn test_from_async_awaits_future() {
        let mut backoff = from_async(|attempt, _err: &String| async move {
            tokio::task::yield_now().await;
            Ok(Duration::from_millis(u64::from(attempt) * 7))
        });

        assert_eq!(
            backoff.backoff(3, &"x".to_string()).await,
            Ok(Duration::from_millis(21))
        );
    }

    #[tokio::test]
    async fn test_strategy_as_backoff() {
        let mut strategy = DelayStrategy::fibonacci(Duration::from_millis(10));
        let delay = Backoff::<String>::backoff(&mut strategy, 5, &"x".to_string()).await;
        assert_eq!(delay, Ok(Duration::from_millis(50)));
    }

    #[test]
    fn test_adapters_are_debug() {
        let backoff = from_fn(|_, _: &String| Duration::ZERO);
        assert!(format!("{:?}", backoff).contains("FromFn"));
    }
}
