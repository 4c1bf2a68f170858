//! Bounded send-with-retry loop.
//!
//! One call moves through these states:
//!
//! ```text
//! Pending -> {RateLimited -> Pending}* -> {TransportRetrying -> Pending}*
//!         -> Succeeded | ApplicationRejected | Exhausted
//! ```
//!
//! Every attempt, rate-limited or not, consumes one unit of the budget.

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, Response, StatusCode};

use super::TRACING_TARGET_RETRY;
use crate::{DeliveryConfig, Error, ErrorKind, Result};

/// Wait applied to a 429 response without a usable `Retry-After` header.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Attempt budget and waits of a send operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, at least 1.
    pub max_attempts: u32,
    /// Linear backoff unit after a transport failure.
    pub base_backoff: Duration,
    /// Timeout of a single attempt.
    pub timeout: Duration,
}

impl RetryPolicy {
    /// Returns the wait after transport failure number `attempt` (1-based).
    ///
    /// The wait grows linearly: one unit after the first attempt, two after
    /// the second, and so on.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff.saturating_mul(attempt)
    }
}

impl From<&DeliveryConfig> for RetryPolicy {
    fn from(config: &DeliveryConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            base_backoff: config.backoff(),
            timeout: config.effective_timeout(),
        }
    }
}

/// Reads the wait requested by a 429 response.
///
/// The `Retry-After` header is read as whole seconds; a missing or
/// unparsable header yields [`DEFAULT_RETRY_AFTER`].
pub fn retry_after(headers: &HeaderMap) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map_or(DEFAULT_RETRY_AFTER, Duration::from_secs)
}

/// Strategy for one kind of request sent through [`execute`].
#[async_trait::async_trait]
pub(crate) trait Exchange: Send + Sync {
    /// Value produced from an accepted response.
    type Output: Send;

    /// Name of the remote operation, used in logs and errors.
    fn name(&self) -> &'static str;

    /// Builds the request of one attempt.
    fn build(&self, http: &Client) -> Result<RequestBuilder>;

    /// Interprets a response with a successful HTTP status.
    ///
    /// Retryable errors count as a failed attempt; any other error ends the
    /// operation immediately.
    async fn interpret(&self, response: Response) -> Result<Self::Output>;
}

/// Output of an operation that succeeded after one or more attempts.
#[derive(Debug)]
pub(crate) struct Attempted<T> {
    pub output: T,
    pub status_code: u16,
    pub attempts: u32,
    pub waited: Duration,
}

/// Progress of a single send operation.
#[derive(Debug, Default)]
struct RetryState {
    attempt: u32,
    last_error: Option<Error>,
    wait: Duration,
    waited: Duration,
}

impl RetryState {
    fn record(&mut self, error: Error, wait: Duration) {
        self.last_error = Some(error);
        self.wait = wait;
    }

    fn into_exhausted(self, name: &str) -> Error {
        let attempts = match self.attempt {
            1 => "1 attempt".to_owned(),
            n => format!("{n} attempts"),
        };
        let error = Error::transport_exhausted()
            .with_message(format!("{name} failed after {attempts}"));

        match self.last_error {
            Some(last_error) => error.with_source(last_error),
            None => error,
        }
    }
}

/// Sends the exchange's request until it is accepted, rejected, or the
/// policy's attempt budget is spent.
///
/// No wait follows the final attempt.
pub(crate) async fn execute<E: Exchange>(
    http: &Client,
    policy: &RetryPolicy,
    exchange: &E,
) -> Result<Attempted<E::Output>> {
    let mut state = RetryState::default();
    let name = exchange.name();

    for attempt in 1..=policy.max_attempts {
        state.attempt = attempt;
        let retrying = attempt < policy.max_attempts;

        tracing::debug!(
            target: TRACING_TARGET_RETRY,
            operation = name,
            attempt,
            max_attempts = policy.max_attempts,
            "Sending request"
        );

        let request = exchange.build(http)?.timeout(policy.timeout);
        let (error, wait) = match request.send().await {
            Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                let wait = retry_after(response.headers());
                tracing::warn!(
                    target: TRACING_TARGET_RETRY,
                    operation = name,
                    attempt,
                    wait_ms = ?retrying.then(|| wait.as_millis()),
                    "Rate limited"
                );

                let error = Error::rate_limited().with_message("HTTP 429 Too Many Requests");
                (error, wait)
            }
            Ok(response) if response.status().is_success() => {
                let status_code = response.status().as_u16();
                match exchange.interpret(response).await {
                    Ok(output) => {
                        tracing::debug!(
                            target: TRACING_TARGET_RETRY,
                            operation = name,
                            attempt,
                            status_code,
                            waited_ms = state.waited.as_millis(),
                            "Request accepted"
                        );

                        return Ok(Attempted {
                            output,
                            status_code,
                            attempts: attempt,
                            waited: state.waited,
                        });
                    }
                    Err(error) if error.is_retryable() => (error, policy.backoff(attempt)),
                    Err(error) => {
                        tracing::error!(
                            target: TRACING_TARGET_RETRY,
                            operation = name,
                            attempt,
                            error = %error,
                            "Request rejected"
                        );
                        return Err(error);
                    }
                }
            }
            Ok(response) => {
                let status = response.status();
                let error = Error::network_error().with_message(format!("HTTP {status}"));
                (error, policy.backoff(attempt))
            }
            Err(error) => {
                let error = Error::from(error);
                if !error.is_retryable() {
                    return Err(error);
                }
                (error, policy.backoff(attempt))
            }
        };

        if error.kind() != ErrorKind::RateLimited {
            if retrying {
                tracing::warn!(
                    target: TRACING_TARGET_RETRY,
                    operation = name,
                    attempt,
                    error = %error,
                    wait_ms = wait.as_millis(),
                    "Attempt failed"
                );
            } else {
                tracing::warn!(
                    target: TRACING_TARGET_RETRY,
                    operation = name,
                    attempt,
                    error = %error,
                    "Final attempt failed"
                );
            }
        }

        state.record(error, wait);
        if retrying {
            tokio::time::sleep(state.wait).await;
            state.waited += state.wait;
        }
    }

    let error = state.into_exhausted(name);
    tracing::error!(
        target: TRACING_TARGET_RETRY,
        operation = name,
        attempts = policy.max_attempts,
        error = %error,
        "Retry budget exhausted"
    );

    Err(error)
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 4,
            base_backoff: Duration::from_millis(800),
            timeout: Duration::from_secs(15),
        }
    }

    #[test]
    fn test_backoff_is_linear() {
        let policy = policy();
        assert_eq!(policy.backoff(1), Duration::from_millis(800));
        assert_eq!(policy.backoff(2), Duration::from_millis(1600));
        assert_eq!(policy.backoff(3), Duration::from_millis(2400));
    }

    #[test]
    fn test_backoff_is_non_decreasing() {
        let policy = policy();
        let waits: Vec<Duration> = (1..=10).map(|attempt| policy.backoff(attempt)).collect();
        assert!(waits.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn test_policy_from_config() {
        let config = DeliveryConfig::default()
            .with_max_retries(5)
            .with_backoff_ms(10)
            .with_timeout(0);
        let policy = RetryPolicy::from(&config);

        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.base_backoff, Duration::from_millis(10));
        assert_eq!(policy.timeout, config.effective_timeout());
    }

    #[test]
    fn test_retry_after_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), DEFAULT_RETRY_AFTER);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(retry_after(&headers), Duration::from_secs(7));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("0"));
        assert_eq!(retry_after(&headers), Duration::ZERO);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(retry_after(&headers), DEFAULT_RETRY_AFTER);

        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after(&headers), DEFAULT_RETRY_AFTER);
    }

    #[test]
    fn test_exhausted_error_wraps_last_error() {
        let mut state = RetryState::default();
        state.attempt = 3;
        state.record(Error::rate_limited(), DEFAULT_RETRY_AFTER);

        let error = state.into_exhausted("chat.postMessage");
        assert_eq!(error.kind(), ErrorKind::TransportExhausted);
        assert_eq!(
            error.message.as_deref(),
            Some("chat.postMessage failed after 3 attempts")
        );
        assert!(error.source.is_some());
    }

    #[test]
    fn test_exhausted_error_after_single_attempt() {
        let mut state = RetryState::default();
        state.attempt = 1;
        state.record(Error::network_error(), Duration::from_millis(800));

        let error = state.into_exhausted("webhook");
        assert_eq!(error.message.as_deref(), Some("webhook failed after 1 attempt"));
    }
}
