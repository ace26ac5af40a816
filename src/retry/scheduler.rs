//! The attempt/wait loop.

use std::convert::Infallible;
use std::future::Future;
use std::num::NonZeroU32;

use futures::future::pending;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::retry::backoff::Backoff;
use crate::retry::error::CancelError;
use crate::retry::policy::RetryPolicy;

/// Drives an operation through bounded, strictly sequential retries.
///
/// A scheduler only carries its [`RetryPolicy`]. Every call to
/// [`run`](Self::run) owns its own attempt counter, so one scheduler can drive
/// any number of concurrent runs without them observing each other.
///
/// # Why a supplier function?
///
/// A future can only be polled to completion once. Retrying means building a
/// fresh one per attempt, so the operation is passed as `FnMut(u32) -> Fut`
/// and called with the 1-indexed attempt number. The scheduler never assumes
/// the operation is idempotent.
///
/// # Examples
///
/// ```rust
/// use rebound::{backoff, RetryPolicy, RetryScheduler};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let scheduler = RetryScheduler::new(RetryPolicy::new(5).unwrap());
///
/// let result = scheduler
///     .run(
///         |attempt| async move {
///             if attempt == 3 {
///                 Ok(123)
///             } else {
///                 Err(format!("bad future {}", attempt))
///             }
///         },
///         backoff::from_fn(|_attempt, _err: &String| Duration::ZERO),
///     )
///     .await;
///
/// assert_eq!(result, Ok(123));
/// # });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryScheduler {
    policy: RetryPolicy,
}

impl RetryScheduler {
    /// Create a scheduler enforcing `policy`.
    pub const fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Get the policy this scheduler enforces.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run `supplier` until it succeeds or the policy's attempts are spent.
    ///
    /// Resolves with the first success value. On exhaustion, resolves with the
    /// final attempt's error exactly as the supplier produced it. If the
    /// backoff fails, its error is returned at once and no further attempts
    /// are made.
    ///
    /// Dropping the returned future stops the run at its current suspension
    /// point.
    pub async fn run<T, E, S, Fut, B>(&self, supplier: S, backoff: B) -> Result<T, E>
    where
        S: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        B: Backoff<E>,
    {
        match self.drive(supplier, backoff, pending::<Infallible>).await {
            Ok(outcome) => outcome,
            Err(Stopped { signal, .. }) => match signal {},
        }
    }

    /// Like [`run`](Self::run), but stops as soon as `token` is cancelled.
    ///
    /// The token is observed before every attempt, while an attempt is in
    /// flight, while the backoff resolves and while sleeping. In-flight work is
    /// dropped on cancellation and the number of attempts started so far is
    /// reported in [`CancelError::Cancelled`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rebound::{CancelError, RetryPolicy, RetryScheduler};
    /// use std::time::Duration;
    /// use tokio_util::sync::CancellationToken;
    ///
    /// # tokio_test::block_on(async {
    /// let token = CancellationToken::new();
    /// let scheduler = RetryScheduler::new(RetryPolicy::new(10).unwrap());
    ///
    /// let canceller = token.clone();
    /// let result = scheduler
    ///     .run_until_cancelled(
    ///         move |_attempt| {
    ///             // Give up on the whole run from inside the first attempt.
    ///             canceller.cancel();
    ///             async { Err::<(), _>("transient") }
    ///         },
    ///         Duration::from_millis(1),
    ///         &token,
    ///     )
    ///     .await;
    ///
    /// assert_eq!(result, Err(CancelError::Cancelled { attempts: 1 }));
    /// # });
    /// ```
    pub async fn run_until_cancelled<T, E, S, Fut, B>(
        &self,
        supplier: S,
        backoff: B,
        token: &CancellationToken,
    ) -> Result<T, CancelError<E>>
    where
        S: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        B: Backoff<E>,
    {
        match self.drive(supplier, backoff, || token.cancelled()).await {
            Ok(outcome) => outcome.map_err(CancelError::Inner),
            Err(Stopped { attempts, .. }) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(attempts, "retry run cancelled");
                Err(CancelError::Cancelled { attempts })
            }
        }
    }

    /// The attempt loop. Every suspension point races against a fresh `stop()`
    /// future; `stop` is also polled once before each attempt starts.
    async fn drive<T, E, S, Fut, B, W>(
        &self,
        mut supplier: S,
        mut backoff: B,
        stop: impl Fn() -> W,
    ) -> Result<Result<T, E>, Stopped<W::Output>>
    where
        S: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        B: Backoff<E>,
        W: Future,
    {
        let mut attempt = 1u32;

        loop {
            if let Some(signal) = stop().now_or_never() {
                return Err(Stopped::after(signal, attempt - 1));
            }

            let error = match unless_stopped(stop(), supplier(attempt)).await {
                Ok(Ok(value)) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(attempt, "operation succeeded");
                    return Ok(Ok(value));
                }
                Ok(Err(error)) => error,
                Err(signal) => return Err(Stopped::after(signal, attempt)),
            };

            if self.policy.is_final(attempt) {
                #[cfg(feature = "tracing")]
                tracing::warn!(attempts = attempt, "retry attempts exhausted");
                return Ok(Err(error));
            }

            let delay = match unless_stopped(stop(), backoff.backoff(attempt, &error)).await {
                Ok(Ok(delay)) => delay,
                Ok(Err(backoff_error)) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(attempt, "backoff failed, abandoning remaining attempts");
                    return Ok(Err(backoff_error));
                }
                Err(signal) => return Err(Stopped::after(signal, attempt)),
            };

            #[cfg(feature = "tracing")]
            tracing::debug!(
                attempt,
                max_attempts = self.policy.max_attempts(),
                ?delay,
                "attempt failed, retrying"
            );

            if let Err(signal) = unless_stopped(stop(), tokio::time::sleep(delay)).await {
                return Err(Stopped::after(signal, attempt));
            }
            attempt += 1;
        }
    }
}

/// A run interrupted by its stop signal after starting `attempts` attempts.
struct Stopped<S> {
    signal: S,
    attempts: u32,
}

impl<S> Stopped<S> {
    fn after(signal: S, attempts: u32) -> Self {
        Self { signal, attempts }
    }
}

/// Run `supplier` with up to `max_attempts` attempts, waiting `backoff`
/// between them.
///
/// Shorthand for `RetryScheduler::new(max_attempts.into()).run(supplier, backoff)`.
///
/// # Examples
///
/// ```rust
/// use rebound::{backoff, retry};
/// use std::num::NonZeroU32;
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let result = retry(
///     |attempt| async move { Err::<(), _>(format!("bad future {}", attempt)) },
///     NonZeroU32::new(3).unwrap(),
///     backoff::from_fn(|_attempt, _err: &String| Duration::ZERO),
/// )
/// .await;
///
/// assert_eq!(result, Err("bad future 3".to_string()));
/// # });
/// ```
pub async fn retry<T, E, S, Fut, B>(
    supplier: S,
    max_attempts: NonZeroU32,
    backoff: B,
) -> Result<T, E>
where
    S: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    B: Backoff<E>,
{
    RetryScheduler::new(RetryPolicy::from(max_attempts))
        .run(supplier, backoff)
        .await
}

/// Race several runs, returning whichever settles first.
///
/// "Settles" means either outcome: a run that fails first wins over runs that
/// would have succeeded later. The losing runs are dropped, which stops their
/// attempt loops at their current suspension point.
///
/// # Panics
///
/// Panics if `runs` is empty.
///
/// # Examples
///
/// ```rust
/// use futures::FutureExt;
/// use rebound::{race, RetryPolicy, RetryScheduler};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let scheduler = RetryScheduler::new(RetryPolicy::new(3).unwrap());
///
/// let slow = scheduler.run(
///     |attempt| async move { if attempt == 2 { Ok("slow") } else { Err("retry") } },
///     Duration::from_millis(50),
/// );
/// let fast = scheduler.run(
///     |attempt| async move { if attempt == 2 { Ok("fast") } else { Err("retry") } },
///     Duration::from_millis(5),
/// );
///
/// // Each run has its own future type; box them to race them together.
/// assert_eq!(race(vec![slow.boxed(), fast.boxed()]).await, Ok("fast"));
/// # });
/// ```
pub async fn race<I, F, T, E>(runs: I) -> Result<T, E>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    let runs: Vec<_> = runs.into_iter().map(Box::pin).collect();
    if runs.is_empty() {
        panic!("race called with no runs");
    }

    let (outcome, _index, _losers) = futures::future::select_all(runs).await;
    outcome
}

/// Await `fut`, or give up with the signal once `stop` resolves first.
async fn unless_stopped<W, F>(stop: W, fut: F) -> Result<F::Output, W::Output>
where
    W: Future,
    F: Future,
{
    tokio::select! {
        biased;
        signal = stop => Err(signal),
        output = fut => Ok(output),
    }
}
