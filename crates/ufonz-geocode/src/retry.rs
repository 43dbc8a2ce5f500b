//! Bounded retry for geocoder requests.
//!
//! Two budgets are tracked separately:
//! - a timeout gets exactly one immediate retry of the same query;
//! - other transient failures (network errors, HTTP 429, HTTP 5xx) get up to
//!   `max_retries` retries with exponential back-off and jitter.
//!
//! Everything else is returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::GeocodeError;

/// Retries granted to a timed-out request.
pub(crate) const TIMEOUT_RETRIES: u32 = 1;

const MAX_DELAY_MS: u64 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after a transient non-timeout failure.
    pub max_retries: u32,
    /// Base delay: the n-th retry waits `backoff_base_ms * 2^(n-1)` ± 25 %.
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_base_ms: 500,
        }
    }
}

/// Returns `true` for non-timeout errors worth retrying after a back-off.
///
/// Not retriable: 4xx other than 429 (the request itself is wrong), bad
/// response bodies, bad coordinates, bad base URL.
pub(crate) fn is_retriable(err: &GeocodeError) -> bool {
    match err {
        GeocodeError::Http(_) | GeocodeError::RateLimited { .. } => true,
        GeocodeError::UnexpectedStatus { status, .. } => *status >= 500,
        GeocodeError::Timeout { .. }
        | GeocodeError::Deserialize { .. }
        | GeocodeError::InvalidCoordinate { .. }
        | GeocodeError::InvalidBaseUrl { .. } => false,
    }
}

/// Runs `operation` under `policy`. The last error is returned once a budget
/// is spent.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, GeocodeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GeocodeError>>,
{
    let mut timeouts = 0u32;
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if let GeocodeError::Timeout { query } = &err {
            if timeouts >= TIMEOUT_RETRIES {
                return Err(err);
            }
            timeouts += 1;
            tracing::warn!(query = %query, "geocoder timed out; retrying once");
            continue;
        }

        if !is_retriable(&err) || attempt >= policy.max_retries {
            return Err(err);
        }
        attempt += 1;

        let delay_ms = backoff_delay_ms(policy.backoff_base_ms, attempt);
        tracing::warn!(
            attempt,
            max_retries = policy.max_retries,
            delay_ms,
            error = %err,
            "transient geocoder error; retrying after back-off"
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn backoff_delay_ms(base_ms: u64, attempt: u32) -> u64 {
    let computed = base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(10));
    let capped = computed.min(MAX_DELAY_MS);
    (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    const NO_BACKOFF: RetryPolicy = RetryPolicy {
        max_retries: 3,
        backoff_base_ms: 0,
    };

    fn timeout() -> GeocodeError {
        GeocodeError::Timeout {
            query: "Tauranga, New Zealand".to_owned(),
        }
    }

    fn server_error() -> GeocodeError {
        GeocodeError::UnexpectedStatus {
            status: 503,
            query: "Tauranga, New Zealand".to_owned(),
        }
    }

    #[test]
    fn classification() {
        assert!(is_retriable(&GeocodeError::RateLimited {
            retry_after_secs: 1
        }));
        assert!(is_retriable(&server_error()));
        assert!(!is_retriable(&GeocodeError::UnexpectedStatus {
            status: 403,
            query: "x".to_owned()
        }));
        assert!(!is_retriable(&timeout()));
    }

    #[test]
    fn backoff_is_capped_and_zero_base_is_zero() {
        assert_eq!(backoff_delay_ms(0, 4), 0);
        assert!(backoff_delay_ms(1_000_000, 9) <= MAX_DELAY_MS * 5 / 4);
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(NO_BACKOFF, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, GeocodeError>(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn timeout_is_retried_exactly_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(NO_BACKOFF, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(timeout())
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(matches!(result, Err(GeocodeError::Timeout { .. })));
    }

    #[tokio::test]
    async fn timeout_then_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(NO_BACKOFF, || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(timeout())
                } else {
                    Ok::<u32, GeocodeError>(11)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 11);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn transient_errors_exhaust_retry_budget() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let policy = RetryPolicy {
            max_retries: 2,
            backoff_base_ms: 0,
        };
        let result = retry_with_backoff(policy, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(server_error())
            }
        })
        .await;
        // max_retries=2 → 3 total attempts
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(
            result,
            Err(GeocodeError::UnexpectedStatus { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn timeout_budget_is_separate_from_transient_budget() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let policy = RetryPolicy {
            max_retries: 1,
            backoff_base_ms: 0,
        };
        let result = retry_with_backoff(policy, || {
            let c = Arc::clone(&c);
            async move {
                match c.fetch_add(1, Ordering::SeqCst) {
                    0 => Err(server_error()),
                    1 => Err(timeout()),
                    _ => Ok::<u32, GeocodeError>(5),
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_client_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(NO_BACKOFF, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(GeocodeError::UnexpectedStatus {
                    status: 400,
                    query: "x".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            result,
            Err(GeocodeError::UnexpectedStatus { status: 400, .. })
        ));
    }

    #[tokio::test]
    async fn does_not_retry_deserialize_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(NO_BACKOFF, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                let e = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
                Err::<u32, GeocodeError>(GeocodeError::Deserialize {
                    context: "test".to_owned(),
                    source: e,
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(GeocodeError::Deserialize { .. })));
    }
}
