//! Bounded retry with exponential backoff and jitter.
//!
//! [`RetryClient`] wraps a [`SerpTransport`] and owns all retrying: a
//! transport failure and an engine-reported error field both consume
//! one attempt, callers above never retry further. Sleeping goes
//! through the injected [`Sleeper`] seam so tests can run the full
//! attempt budget without real delay.

use crate::config::AcquireConfig;
use crate::error::SerpError;
use crate::params::CallParams;
use crate::transport::SerpTransport;
use crate::types::SerpPage;
use rand::Rng;
use std::time::Duration;

/// Injected async sleep, the only suspension primitive in the crate.
pub trait Sleeper: Send + Sync {
    /// Suspend for the given duration.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}

/// Production sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Retry tuning extracted from the acquisition config.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts per call, including the first. Always ≥ 1.
    pub max_attempts: u32,
    /// Base backoff, doubled per completed attempt.
    pub base_backoff: Duration,
    /// Upper bound of the uniform jitter added to each backoff sleep.
    pub max_jitter: Duration,
}

impl RetryPolicy {
    /// Extract the retry knobs from a validated config.
    pub fn from_config(config: &AcquireConfig) -> Self {
        Self {
            max_attempts: config.retry_max_attempts.max(1),
            base_backoff: Duration::from_millis(config.base_backoff_ms),
            max_jitter: Duration::from_millis(config.max_jitter_ms),
        }
    }
}

/// Executes one API call with a bounded retry budget.
pub struct RetryClient<T, S> {
    transport: T,
    sleeper: S,
    policy: RetryPolicy,
}

impl<T: SerpTransport, S: Sleeper> RetryClient<T, S> {
    pub fn new(transport: T, sleeper: S, policy: RetryPolicy) -> Self {
        Self {
            transport,
            sleeper,
            policy,
        }
    }

    /// Access to the wrapped transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Execute a call, retrying transport failures and engine errors up
    /// to the attempt budget.
    ///
    /// Between attempts sleeps `base_backoff * 2^(attempt-1)` plus
    /// uniform jitter; never sleeps after the final attempt.
    ///
    /// # Errors
    ///
    /// Returns [`SerpError::RetriesExhausted`] carrying the last
    /// failure message once the budget is spent. Callers must not retry
    /// further.
    pub async fn execute(&self, params: &CallParams) -> Result<SerpPage, SerpError> {
        let mut last_message = String::new();

        for attempt in 1..=self.policy.max_attempts {
            tracing::debug!(
                engine = params.engine(),
                attempt,
                max = self.policy.max_attempts,
                params = %params,
                "dispatching API call"
            );

            match self.transport.execute(params).await {
                Ok(page) => match &page.error {
                    None => return Ok(page),
                    Some(message) => {
                        tracing::warn!(
                            engine = params.engine(),
                            attempt,
                            error = %message,
                            "engine reported an error"
                        );
                        last_message = SerpError::Api(message.clone()).to_string();
                    }
                },
                Err(err) => {
                    tracing::warn!(
                        engine = params.engine(),
                        attempt,
                        error = %err,
                        "call attempt failed"
                    );
                    last_message = err.to_string();
                }
            }

            if attempt < self.policy.max_attempts {
                self.sleeper.sleep(self.backoff_delay(attempt)).await;
            }
        }

        Err(SerpError::RetriesExhausted {
            attempts: self.policy.max_attempts,
            message: last_message,
        })
    }

    /// Backoff before the attempt following `completed_attempt`.
    fn backoff_delay(&self, completed_attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(completed_attempt - 1).unwrap_or(u32::MAX);
        let backoff = self.policy.base_backoff.saturating_mul(factor);
        let jitter_ms = self.policy.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
        };
        backoff + jitter
    }
}
