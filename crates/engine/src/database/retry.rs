//! Conflict retry for read-modify-write
//!
//! The backend only offers single-document CAS writes. Operations that
//! read a document, change it and write it back loop here when the write
//! loses a CAS race. Failures other than a conflict are never retried.

use clinicdb_core::{DocId, Result, StoreError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Configuration for CAS conflict retry
///
/// # Example
/// ```
/// use clinicdb_engine::RetryConfig;
///
/// let config = RetryConfig::new().with_max_retries(5).with_max_delay_ms(200);
/// assert_eq!(config.max_retries, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = no retries)
    pub max_retries: usize,
    /// Base delay between retries in milliseconds (exponential backoff)
    pub base_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 10,
            max_delay_ms: 100,
        }
    }
}

impl RetryConfig {
    /// Create a new RetryConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a RetryConfig with no retries
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Set maximum number of retries
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set base delay for exponential backoff
    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Set maximum delay between retries
    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Delay before retry number `attempt` (0-based)
    pub(crate) fn calculate_delay(&self, attempt: usize) -> Duration {
        let shift = attempt.min(63);
        let multiplier = 1u64 << shift;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier);
        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }
}

/// Outcome of one read-modify-write attempt
#[derive(Debug)]
pub(crate) enum Attempt<T> {
    /// Finished, with or without a write
    Done(T),
    /// The CAS write lost a race; read again
    Conflict,
}

/// Run `attempt` until it finishes, retrying only on CAS conflict
///
/// # Errors
///
/// Whatever `attempt` returns, or `CAS_CONFLICT` once retries run out.
pub(crate) fn retry_on_conflict<T, F>(config: &RetryConfig, id: &DocId, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Result<Attempt<T>>,
{
    for n in 0..=config.max_retries {
        match attempt()? {
            Attempt::Done(value) => return Ok(value),
            Attempt::Conflict if n < config.max_retries => {
                let delay = config.calculate_delay(n);
                warn!(
                    target: "clinicdb::store",
                    id = %id,
                    attempt = n + 1,
                    delay_ms = delay.as_millis() as u64,
                    "CAS conflict, retrying"
                );
                std::thread::sleep(delay);
            }
            Attempt::Conflict => {}
        }
    }

    warn!(
        target: "clinicdb::store",
        id = %id,
        retries = config.max_retries,
        "CAS conflict retries exhausted"
    );
    Err(StoreError::cas_conflict(format!(
        "document {} changed concurrently; gave up after {} retries",
        id, config.max_retries
    ))
    .into())
}
