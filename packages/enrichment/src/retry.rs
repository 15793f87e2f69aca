//! Resilient call wrapper shared by every provider adapter.
//!
//! One wrapper applies the whole protocol budget: hard timeout, bounded
//! retries with exponential backoff for transient failures, and circuit
//! breaker bookkeeping. Failures come back as typed values carrying the
//! number of attempts actually used, never as panics.

use std::future::Future;
use std::time::Duration;

use crate::breaker::BreakerRegistry;
use crate::error::ProviderError;

/// Retry/timeout budget for a single upstream call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first (2 => at most 3 attempts)
    pub max_retries: u32,
    /// Hard per-attempt timeout
    pub timeout: Duration,
    /// First backoff delay; doubles per retry
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Worst-case wall-clock time one [`resilient_call`] may consume:
    /// every attempt runs to its hard timeout with the full backoff slept
    /// in between. Outer deadlines must be at least this long per call or
    /// they cancel the chain before it can produce a result.
    pub fn max_elapsed(&self) -> Duration {
        let mut total = self.timeout * (self.max_retries + 1);
        let mut delay = self.base_delay;
        for _ in 0..self.max_retries {
            total += delay;
            delay *= 2;
        }
        total
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            timeout: Duration::from_secs(15),
            base_delay: Duration::from_millis(500),
        }
    }
}

/// A single attempt's failure, classified for retry purposes.
#[derive(Debug, Clone)]
pub enum CallError {
    /// Breaker was open; no attempt was made
    CircuitOpen,
    /// Attempt exceeded the hard timeout
    Timeout,
    /// HTTP 429 or 5xx; retried within budget
    Transient { status: Option<u16>, message: String },
    /// Other 4xx; never retried
    Permanent { status: u16, message: String },
    /// Connection-level failure; retried within budget
    Transport(String),
}

impl CallError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            CallError::Timeout | CallError::Transient { .. } | CallError::Transport(_)
        )
    }

    /// Classify a reqwest failure into a [`CallError`].
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return CallError::Timeout;
        }
        CallError::Transport(e.to_string())
    }

    /// Classify an HTTP status into a [`CallError`].
    pub fn from_status(status: u16, message: String) -> Self {
        if status == 429 || status >= 500 {
            CallError::Transient {
                status: Some(status),
                message,
            }
        } else {
            CallError::Permanent { status, message }
        }
    }
}

/// Typed failure returned after the budget is exhausted.
#[derive(Debug, Clone)]
pub struct CallFailure {
    pub error: CallError,
    /// Attempts actually made (including the first)
    pub attempts: u32,
}

impl CallFailure {
    /// Convert into the provider-level error surfaced to the orchestrator.
    pub fn into_provider_error(self, provider: &str) -> ProviderError {
        match self.error {
            CallError::CircuitOpen => ProviderError::CircuitOpen {
                provider: provider.to_string(),
            },
            CallError::Timeout => ProviderError::Timeout {
                attempts: self.attempts,
            },
            CallError::Transient { status, message } => ProviderError::Transient {
                status,
                attempts: self.attempts,
                message,
            },
            CallError::Permanent { status, message } => {
                ProviderError::Permanent { status, message }
            }
            CallError::Transport(message) => ProviderError::Transport(message),
        }
    }
}

/// Run `op` against `provider` under the retry/timeout budget.
///
/// Short-circuits without a network attempt while the provider's breaker is
/// open. A success resets the breaker; a non-retryable failure or exhausted
/// budget records a breaker failure.
pub async fn resilient_call<T, F, Fut>(
    breakers: &BreakerRegistry,
    provider: &str,
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T, CallFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CallError>>,
{
    if breakers.is_open(provider) {
        tracing::debug!(provider, "short-circuiting call: breaker open");
        return Err(CallFailure {
            error: CallError::CircuitOpen,
            attempts: 0,
        });
    }

    let mut attempts = 0u32;
    let mut delay = policy.base_delay;

    loop {
        attempts += 1;

        let outcome = match tokio::time::timeout(policy.timeout, op()).await {
            Ok(result) => result,
            Err(_) => Err(CallError::Timeout),
        };

        match outcome {
            Ok(value) => {
                breakers.record_success(provider);
                return Ok(value);
            }
            Err(error) if error.is_retryable() && attempts <= policy.max_retries => {
                tracing::debug!(
                    provider,
                    attempt = attempts,
                    delay_ms = delay.as_millis() as u64,
                    "transient failure, backing off before retry"
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(error) => {
                breakers.record_failure(provider);
                return Err(CallFailure { error, attempts });
            }
        }
    }
}
