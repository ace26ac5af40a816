//! Retry-with-backoff scheduling for fallible async operations.
//!
//! The pieces are deliberately small:
//!
//! - [`RetryPolicy`]: how many attempts a run may make, nothing else
//! - [`Backoff`]: how long to wait after a failed attempt, decided by the caller
//! - [`RetryScheduler`]: drives the attempt/wait loop for one policy
//!
//! # Quick Start
//!
//! ```rust
//! use rebound::{DelayStrategy, RetryPolicy, RetryScheduler};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let scheduler = RetryScheduler::new(RetryPolicy::new(3).unwrap());
//!
//! let result: Result<u32, String> = scheduler
//!     .run(
//!         |attempt| async move { Ok(attempt) },
//!         DelayStrategy::exponential(Duration::from_millis(100)),
//!     )
//!     .await;
//!
//! assert_eq!(result, Ok(1));
//! # });
//! ```
//!
//! # Semantics
//!
//! - Attempts are numbered from 1 and never overlap within a run.
//! - The backoff is consulted once per failed attempt that will be followed by
//!   another one, with the failed attempt's index and error.
//! - The terminal error is the last attempt's error, returned as-is. A backoff
//!   that fails aborts the run with its own error.
//! - Runs share nothing, so several can be raced against each other with
//!   [`race`]. Use [`RetryScheduler::run_until_cancelled`] for runs that need
//!   an external stop signal.
//!
//! # Error Types
//!
//! - [`PolicyError`]: Returned when a policy is built with zero attempts
//! - [`CancelError`]: Returned by cancellable runs

pub mod backoff;
#[cfg(feature = "serde")]
mod config;
mod error;
mod policy;
mod scheduler;

pub use backoff::{Backoff, DelayKind, DelayStrategy};
#[cfg(feature = "serde")]
pub use config::{RetryConfig, StrategyConfig};
pub use error::{CancelError, PolicyError};
pub use policy::RetryPolicy;
pub use scheduler::{race, retry, RetryScheduler};
