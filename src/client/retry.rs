//! Bounded retry on HTTP 429.
//!
//! The trackers signal rate limiting with 429 and no reliable `Retry-After`,
//! so the policy is a fixed sleep followed by a bounded number of retries.
//! A 429 that survives the last retry becomes `RateLimited`.

use super::{ApiRequest, ApiResponse, Transport};
use crate::error::{BridgeError, Result};
use std::thread;
use std::time::Duration;
use tracing::warn;

/// HTTP status used by both trackers for rate limiting.
pub const TOO_MANY_REQUESTS: u16 = 429;

/// How long to wait after a 429 and how many times to try again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(60),
            max_retries: 1,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            max_retries: 1,
        }
    }
}

/// Send `request`, sleeping and retrying while the tracker answers 429.
///
/// Only the rate-limit status is retried here; every other status is handed
/// back to the caller to interpret.
///
/// # Errors
///
/// Returns `RateLimited` if the final attempt is still 429, or the
/// transport's own error (timeout, connection failure) unchanged.
pub fn send_with_retry(
    transport: &dyn Transport,
    request: &ApiRequest,
    policy: &RetryPolicy,
) -> Result<ApiResponse> {
    let mut attempts = 0;
    loop {
        attempts += 1;
        let response = transport.send(request)?;
        if response.status != TOO_MANY_REQUESTS {
            return Ok(response);
        }
        if attempts > policy.max_retries {
            return Err(BridgeError::RateLimited {
                url: request.url.clone(),
                attempts,
            });
        }
        warn!(
            url = %request.url,
            body = %response.body,
            delay_secs = policy.delay.as_secs(),
            "Rate limited, waiting before retry"
        );
        thread::sleep(policy.delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::ScriptedTransport;

    fn fast() -> RetryPolicy {
        RetryPolicy::with_delay(Duration::ZERO)
    }

    #[test]
    fn success_is_returned_without_retry() {
        let transport = ScriptedTransport::sequence(vec![ApiResponse::new(200, "{}")]);
        let response =
            send_with_retry(&transport, &ApiRequest::get("https://x"), &fast()).expect("ok");
        assert_eq!(response.status, 200);
        assert_eq!(transport.call_count(), 1);
    }

    #[test]
    fn single_429_is_retried_once() {
        let transport = ScriptedTransport::sequence(vec![
            ApiResponse::new(429, "slow down"),
            ApiResponse::new(200, "{}"),
        ]);
        let response =
            send_with_retry(&transport, &ApiRequest::get("https://x"), &fast()).expect("ok");
        assert_eq!(response.status, 200);
        assert_eq!(transport.call_count(), 2);
    }

    #[test]
    fn second_429_is_rate_limited() {
        let transport = ScriptedTransport::sequence(vec![
            ApiResponse::new(429, "slow down"),
            ApiResponse::new(429, "still slow"),
            ApiResponse::new(200, "{}"),
        ]);
        let err = send_with_retry(&transport, &ApiRequest::get("https://x"), &fast())
            .expect_err("rate limited");
        assert!(matches!(err, BridgeError::RateLimited { attempts: 2, .. }));
        assert!(err.is_retryable());
        assert_eq!(transport.call_count(), 2);
    }

    #[test]
    fn other_statuses_pass_through() {
        let transport = ScriptedTransport::sequence(vec![ApiResponse::new(500, "boom")]);
        let response =
            send_with_retry(&transport, &ApiRequest::get("https://x"), &fast()).expect("ok");
        assert_eq!(response.status, 500);
        assert_eq!(transport.call_count(), 1);
    }

    #[test]
    fn transport_errors_are_not_retried() {
        let transport = ScriptedTransport::new(|request, _| {
            Err(BridgeError::Timeout {
                url: request.url.clone(),
            })
        });
        let err = send_with_retry(&transport, &ApiRequest::get("https://x"), &fast())
            .expect_err("timeout");
        assert!(matches!(err, BridgeError::Timeout { .. }));
        assert_eq!(transport.call_count(), 1);
    }

    #[test]
    fn default_policy_waits_a_minute() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay, Duration::from_secs(60));
        assert_eq!(policy.max_retries, 1);
    }

    #[test]
    fn configured_delay_keeps_single_retry() {
        let policy = RetryPolicy::with_delay(Duration::from_secs(5));
        assert_eq!(policy.delay, Duration::from_secs(5));
        assert_eq!(policy.max_retries, 1);
    }
}
