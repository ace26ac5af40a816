//! Error types for retry operations.
//!
//! Operation and backoff failures are never wrapped: a run hands back the
//! caller's own error type. The types here only cover what the scheduler
//! itself can add, an invalid policy or an external cancellation.

/// Error returned when a [`RetryPolicy`](crate::RetryPolicy) cannot be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyError {
    /// A run must be allowed at least one attempt.
    ZeroAttempts,
}

impl std::fmt::Display for PolicyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroAttempts => write!(f, "retry policy must allow at least one attempt"),
        }
    }
}

impl std::error::Error for PolicyError {}

/// Error returned by a cancellable run.
///
/// Either the run was stopped through its cancellation token, or it settled
/// with an error from the operation or the backoff.
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
/// token.cancel();
///
/// let scheduler = RetryScheduler::new(RetryPolicy::new(3).unwrap());
/// let result = scheduler
///     .run_until_cancelled(
///         |_| async { Err::<(), _>("unreachable") },
///         Duration::from_secs(1),
///         &token,
///     )
///     .await;
///
/// assert_eq!(result, Err(CancelError::Cancelled { attempts: 0 }));
/// # });
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelError<E> {
    /// The run was cancelled before it settled.
    Cancelled {
        /// Number of attempts started before cancellation.
        attempts: u32,
    },
    /// The run settled with an operation or backoff error.
    Inner(E),
}

impl<E> CancelError<E> {
    /// Create a cancellation error.
    pub fn cancelled(attempts: u32) -> Self {
        Self::Cancelled { attempts }
    }

    /// Create an inner error.
    pub fn inner(error: E) -> Self {
        Self::Inner(error)
    }

    /// Returns true if the run was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Returns true if this is an inner error.
    pub fn is_inner(&self) -> bool {
        matches!(self, Self::Inner(_))
    }

    /// Get the inner error if present.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Inner(e) => Some(e),
            Self::Cancelled { .. } => None,
        }
    }
}

impl<E: std::fmt::Display> std::fmt::Display for CancelError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled { attempts } => {
                write!(f, "retry run cancelled after {} attempts", attempts)
            }
            Self::Inner(e) => write!(f, "{}", e),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for CancelError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Cancelled { .. } => None,
            Self::Inner(e) => Some(e),
        }
    }
}
