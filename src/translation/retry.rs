/*!
 * Retry and rate-limit backoff around a provider call.
 *
 * Ordinary failures consume a bounded attempt budget with a fixed delay
 * between attempts. Rate-limit signals are waited out and the same call is
 * re-issued without consuming the budget; the number of such waits and
 * their total duration are both capped.
 */

use log::{debug, error, warn};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::errors::{ProviderError, TranslationError};

/// Retry configuration for provider calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed for non rate-limit failures, first call included
    pub retries: u32,

    /// Delay between two failed attempts
    pub retry_delay: Duration,

    /// Wait used when a rate-limit signal carries no retry-after
    pub default_rate_limit_wait: Duration,

    /// Maximum number of rate-limit waits for one call
    pub max_rate_limit_waits: u32,

    /// Maximum total time spent in rate-limit waits for one call
    pub max_rate_limit_wait_total: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            retry_delay: Duration::from_millis(3000),
            default_rate_limit_wait: Duration::from_millis(3000),
            max_rate_limit_waits: 30,
            max_rate_limit_wait_total: Duration::from_secs(600),
        }
    }
}

impl RetryPolicy {
    /// Run an operation under this policy
    ///
    /// # Arguments
    /// * `label` - Name of the call, for logs
    /// * `operation` - Produces a fresh future for every attempt
    ///
    /// # Returns
    /// * `Result<T, TranslationError>` - The first success, or `RetriesExhausted`
    ///   / `RateLimitCeiling` once the budget or a ceiling is spent
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, TranslationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let max_attempts = self.retries.max(1);
        let mut attempt: u32 = 0;
        let mut rate_limit_waits: u32 = 0;
        let mut rate_limit_waited = Duration::ZERO;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 0 || rate_limit_waits > 0 {
                        debug!(
                            "{}: succeeded after {} failed attempt(s) and {} rate-limit wait(s)",
                            label, attempt, rate_limit_waits
                        );
                    }
                    return Ok(value);
                }
                Err(e) if e.is_rate_limit() => {
                    let wait = e.retry_after().unwrap_or(self.default_rate_limit_wait);
                    if rate_limit_waits >= self.max_rate_limit_waits
                        || rate_limit_waited + wait > self.max_rate_limit_wait_total
                    {
                        error!(
                            "{}: rate-limit ceiling reached after {} wait(s) totalling {:?}",
                            label, rate_limit_waits, rate_limit_waited
                        );
                        return Err(TranslationError::RateLimitCeiling {
                            waits: rate_limit_waits,
                            waited: rate_limit_waited,
                        });
                    }

                    rate_limit_waits += 1;
                    rate_limit_waited += wait;
                    warn!("{}: rate limited, waiting {:?} before retrying ({})", label, wait, e);
                    sleep(wait).await;
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= max_attempts {
                        error!("{}: giving up after {} attempt(s): {}", label, attempt, e);
                        return Err(TranslationError::RetriesExhausted { attempts: attempt, last: e });
                    }

                    warn!(
                        "{}: attempt {}/{} failed: {}. Retrying in {:?}",
                        label, attempt, max_attempts, e, self.retry_delay
                    );
                    sleep(self.retry_delay).await;
                }
            }
        }
    }
}
