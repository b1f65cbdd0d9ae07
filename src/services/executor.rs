//! Retry/execution engine
//!
//! Sends a request through the transport with a per-attempt timeout,
//! retrying timeouts after a fixed delay. Every attempt, retries included,
//! first takes a token from the rate limiter.

use crate::config::ClientConfig;
use crate::models::{ApiResponse, HttpRequest};
use crate::services::limiter::RateLimiter;
use crate::transport::{Transport, TransportFailure};
use crate::utils::error::{ApiError, ApiResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Retry configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Timeout of a single attempt
    pub request_timeout: Duration,
    /// Retries allowed after the first attempt times out
    pub attempts_after_timeout: u32,
    /// Fixed pause before each retry
    pub delay_before_attempt: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            request_timeout: config.request_timeout(),
            attempts_after_timeout: config.attempts_after_timeout,
            delay_before_attempt: config.retry_delay(),
        }
    }

    /// Initial attempt plus retries
    pub fn max_attempts(&self) -> u32 {
        self.attempts_after_timeout.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

/// Executor owning a client's transport and rate limiter
pub struct Executor {
    transport: Arc<dyn Transport>,
    limiter: RateLimiter,
    policy: RetryPolicy,
}

impl Executor {
    pub fn new(transport: Arc<dyn Transport>, limiter: RateLimiter, policy: RetryPolicy) -> Self {
        Self {
            transport,
            limiter,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Perform one attempt, enforcing the timeout even if the transport does not
    async fn attempt(&self, request: &HttpRequest) -> Result<ApiResponse, TransportFailure> {
        let timeout = self.policy.request_timeout;
        match tokio::time::timeout(timeout, self.transport.send(request, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(TransportFailure::Timeout),
        }
    }

    /// Send `request`, returning the response whatever its status
    pub async fn execute(&self, request: &HttpRequest) -> ApiResult<ApiResponse> {
        let max_attempts = self.policy.max_attempts();
        let mut attempts = 0u32;

        loop {
            self.limiter.acquire().await;
            attempts += 1;

            debug!(
                "Sending {} {} via {} (attempt {}/{})",
                request.verb,
                request.url,
                self.transport.name(),
                attempts,
                max_attempts
            );

            match self.attempt(request).await {
                Ok(response) => {
                    debug!("Received status {} after {} attempt(s)", response.status, attempts);
                    return Ok(response);
                }
                Err(TransportFailure::Timeout) if attempts < max_attempts => {
                    warn!(
                        "Request timed out, retrying in {:.1}s (attempt {}/{})",
                        self.policy.delay_before_attempt.as_secs_f64(),
                        attempts,
                        max_attempts
                    );
                    tokio::time::sleep(self.policy.delay_before_attempt).await;
                }
                Err(TransportFailure::Timeout) => {
                    error!("Request timed out on all {} attempts: {} {}", attempts, request.verb, request.url);
                    return Err(ApiError::TimeoutExhausted { attempts });
                }
                Err(TransportFailure::Connection(message)) => {
                    error!("Transport failure for {} {}: {}", request.verb, request.url, message);
                    return Err(ApiError::Transport(message));
                }
            }
        }
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("transport", &self.transport.name())
            .field("limiter", &self.limiter)
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HttpVerb;
    use crate::transport::{ScriptedReply, ScriptedTransport};
    use tokio::time::Instant;

    fn request() -> HttpRequest {
        HttpRequest {
            verb: HttpVerb::Get,
            url: "http://example.test/items".to_string(),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
        }
    }

    fn policy(attempts_after_timeout: u32) -> RetryPolicy {
        RetryPolicy {
            request_timeout: Duration::from_secs(1),
            attempts_after_timeout,
            delay_before_attempt: Duration::from_secs(2),
        }
    }

    #[test]
    fn test_retry_policy_from_config() {
        let config = ClientConfig::default().attempts_after_timeout(3).delay_before_attempt_sec(0.5);
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(policy.delay_before_attempt, Duration::from_millis(500));
        assert_eq!(policy.request_timeout, Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeouts_exhaust_budget() {
        let transport = Arc::new(ScriptedTransport::new().always(ScriptedReply::Timeout));
        let executor = Executor::new(transport.clone(), RateLimiter::unlimited(), policy(3));
        let start = Instant::now();

        let result = executor.execute(&request()).await;

        assert!(matches!(result, Err(ApiError::TimeoutExhausted { attempts: 4 })));
        assert_eq!(transport.calls(), 4);
        // 4 timeouts of 1s and 3 delays of 2s
        assert!(start.elapsed() >= Duration::from_secs(10));

        let recorded = transport.recorded();
        for pair in recorded.windows(2) {
            assert!(pair[1].at - pair[0].at >= Duration::from_secs(3));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_then_success() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .time_out()
                .respond(ApiResponse::new(500, "still a response")),
        );
        let executor = Executor::new(transport.clone(), RateLimiter::unlimited(), policy(5));

        let response = executor.execute(&request()).await.unwrap();

        assert_eq!(response.status, 500);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connection_failure_not_retried() {
        let transport = Arc::new(ScriptedTransport::new().fail("connection refused"));
        let executor = Executor::new(transport.clone(), RateLimiter::unlimited(), policy(5));

        let result = executor.execute(&request()).await;

        match result {
            Err(ApiError::Transport(message)) => assert_eq!(message, "connection refused"),
            other => panic!("Expected transport error, got {:?}", other),
        }
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries() {
        let transport = Arc::new(ScriptedTransport::new().always(ScriptedReply::Timeout));
        let executor = Executor::new(transport.clone(), RateLimiter::unlimited(), policy(0));

        let result = executor.execute(&request()).await;

        assert!(matches!(result, Err(ApiError::TimeoutExhausted { attempts: 1 })));
        assert_eq!(transport.calls(), 1);
    }
}
