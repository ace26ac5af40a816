//! Retry policy configuration.

use std::num::NonZeroU32;

use crate::retry::error::PolicyError;

/// A retry policy bounding how many times an operation may be invoked.
///
/// Policies are pure data: they describe the attempt budget of a run but don't
/// execute anything, which keeps them trivially cloneable and testable. How
/// long to wait between attempts is the job of a [`Backoff`](crate::Backoff).
///
/// # Bounds Behavior
///
/// `max_attempts` counts every invocation, including the first one, and is
/// always at least 1. A policy of 1 means "try once, never retry".
///
/// # Examples
///
/// ```rust
/// use rebound::{PolicyError, RetryPolicy};
///
/// let policy = RetryPolicy::new(5).unwrap();
/// assert_eq!(policy.max_attempts(), 5);
/// assert!(policy.is_final(5));
///
/// assert_eq!(RetryPolicy::new(0), Err(PolicyError::ZeroAttempts));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RetryPolicy {
    max_attempts: NonZeroU32,
}

impl RetryPolicy {
    /// Create a policy allowing up to `max_attempts` invocations.
    ///
    /// Fails with [`PolicyError::ZeroAttempts`] when `max_attempts` is 0.
    pub fn new(max_attempts: u32) -> Result<Self, PolicyError> {
        NonZeroU32::new(max_attempts)
            .map(Self::with_max_attempts)
            .ok_or(PolicyError::ZeroAttempts)
    }

    /// Create a policy from an already validated attempt count.
    pub const fn with_max_attempts(max_attempts: NonZeroU32) -> Self {
        Self { max_attempts }
    }

    /// A policy that invokes the operation exactly once.
    pub const fn single_attempt() -> Self {
        Self {
            max_attempts: NonZeroU32::MIN,
        }
    }

    /// Get the maximum number of attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.get()
    }

    /// Returns true if `attempt` (1-indexed) is the last one this policy allows.
    pub fn is_final(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts.get()
    }
}

impl From<NonZeroU32> for RetryPolicy {
    fn from(max_attempts: NonZeroU32) -> Self {
        Self::with_max_attempts(max_attempts)
    }
}

impl TryFrom<u32> for RetryPolicy {
    type Error = PolicyError;

    fn try_from(max_attempts: u32) -> Result<Self, Self::Error> {
        Self::new(max_attempts)
    }
}
