//! Serializable retry configuration.
//!
//! Lets a retry policy and its delay schedule live in a config file instead of
//! code. Requires the `serde` feature.
//!
//! ```rust
//! use rebound::RetryConfig;
//! use std::time::Duration;
//!
//! let config: RetryConfig = serde_json::from_str(
//!     r#"{ "max_attempts": 4, "strategy": { "kind": "linear", "base_ms": 7 } }"#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.policy().unwrap().max_attempts(), 4);
//! assert_eq!(config.strategy().delay_for_attempt(3), Duration::from_millis(21));
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::backoff::DelayStrategy;
use crate::retry::error::PolicyError;
use crate::retry::policy::RetryPolicy;
use crate::retry::scheduler::RetryScheduler;

/// Retry settings as they appear in configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one. Must be at least 1.
    pub max_attempts: u32,
    /// Delay schedule between attempts.
    #[serde(default)]
    pub strategy: StrategyConfig,
    /// Optional cap on every delay, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_delay_ms: Option<u64>,
}

/// Delay schedule selection, tagged by `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    /// Fixed delay after every failure.
    Constant {
        /// Delay in milliseconds.
        delay_ms: u64,
    },
    /// base * attempt.
    Linear {
        /// Base delay in milliseconds.
        base_ms: u64,
    },
    /// base * 2^(attempt - 1).
    Exponential {
        /// Base delay in milliseconds.
        base_ms: u64,
    },
    /// base * fib(attempt).
    Fibonacci {
        /// Base delay in milliseconds.
        base_ms: u64,
    },
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self::Exponential { base_ms: 100 }
    }
}

impl RetryConfig {
    /// Validate the attempt budget into a [`RetryPolicy`].
    pub fn policy(&self) -> Result<RetryPolicy, PolicyError> {
        RetryPolicy::new(self.max_attempts)
    }

    /// Build the configured [`DelayStrategy`].
    pub fn strategy(&self) -> DelayStrategy {
        let strategy = match self.strategy {
            StrategyConfig::Constant { delay_ms } => {
                DelayStrategy::constant(Duration::from_millis(delay_ms))
            }
            StrategyConfig::Linear { base_ms } => {
                DelayStrategy::linear(Duration::from_millis(base_ms))
            }
            StrategyConfig::Exponential { base_ms } => {
                DelayStrategy::exponential(Duration::from_millis(base_ms))
            }
            StrategyConfig::Fibonacci { base_ms } => {
                DelayStrategy::fibonacci(Duration::from_millis(base_ms))
            }
        };

        match self.max_delay_ms {
            Some(max) => strategy.with_max_delay(Duration::from_millis(max)),
            None => strategy,
        }
    }

    /// Build a scheduler for the configured policy.
    pub fn scheduler(&self) -> Result<RetryScheduler, PolicyError> {
        self.policy().map(RetryScheduler::new)
    }
}
