//! # Rebound
//!
//! Sequential retry-with-backoff scheduling for asynchronous operations that
//! may transiently fail.
//!
//! A run alternates between *invoke the operation* and *wait before the next
//! attempt*, never overlapping attempts, until the operation succeeds or the
//! attempt budget is spent. The delay between attempts is computed by a
//! caller-supplied [`Backoff`] that sees the index and error of the attempt
//! that just failed.
//!
//! ## Quick Example
//!
//! ```rust
//! use rebound::{backoff, retry};
//! use std::num::NonZeroU32;
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let result = retry(
//!     |attempt| async move {
//!         if attempt < 3 {
//!             Err(format!("attempt {} failed", attempt))
//!         } else {
//!             Ok(attempt * 10)
//!         }
//!     },
//!     NonZeroU32::new(5).unwrap(),
//!     backoff::from_fn(|_attempt, _err: &String| Duration::ZERO),
//! )
//! .await;
//!
//! assert_eq!(result, Ok(30));
//! # });
//! ```
//!
//! The crate also ships [`SubscriptionManager`], the channel bookkeeping used
//! by broadcast servers to track which clients listen to which channels.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod retry;
pub mod subscription;

// Re-exports
pub use retry::backoff;
pub use retry::{
    race, retry, Backoff, CancelError, DelayStrategy, PolicyError, RetryPolicy, RetryScheduler,
};
pub use subscription::{SubscriptionHandler, SubscriptionManager};

#[cfg(feature = "serde")]
pub use retry::{RetryConfig, StrategyConfig};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::retry::backoff::{self, Backoff, DelayStrategy};
    pub use crate::retry::{race, retry, CancelError, RetryPolicy, RetryScheduler};
    pub use crate::subscription::{SubscriptionHandler, SubscriptionManager};
    pub use tokio_util::sync::CancellationToken;
}
