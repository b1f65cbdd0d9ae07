//! Rate limiter
//!
//! Token bucket with capacity one and an exact rational refill rate. The
//! bucket itself is a pure state machine over rational timestamps
//! ([`TokenBucket`]); [`RateLimiter`] drives it with the tokio clock.

use crate::utils::rational::Rational;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Token bucket state
///
/// Times are seconds since an arbitrary origin. The bucket never holds
/// more than one token, so idle periods do not build up burst credit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBucket {
    rate: Rational,
    available_tokens: Rational,
    last_refill: Rational,
}

impl TokenBucket {
    /// Full bucket at time zero; `rate` must be positive
    pub fn new(rate: Rational) -> Self {
        Self {
            rate,
            available_tokens: Rational::ONE,
            last_refill: Rational::ZERO,
        }
    }

    pub fn rate(&self) -> Rational {
        self.rate
    }

    pub fn available_tokens(&self) -> Rational {
        self.available_tokens
    }

    pub fn last_refill(&self) -> Rational {
        self.last_refill
    }

    /// Time a caller arriving at `now` waits for the next token.
    ///
    /// Equal to `(1 - available_tokens) / rate` past the later of `now` and
    /// `last_refill`. Does not change the bucket.
    pub fn time_until_token(&self, now: Rational) -> Rational {
        let start = now.max(self.last_refill);
        let refilled = self.refilled_at(start);
        if refilled >= Rational::ONE {
            return start - now;
        }
        start + (Rational::ONE - refilled) / self.rate - now
    }

    /// Consume one token at time `at`.
    ///
    /// The caller must have waited [`time_until_token`](Self::time_until_token)
    /// first; a token is never granted early.
    pub fn take(&mut self, at: Rational) {
        let start = at.max(self.last_refill);
        self.available_tokens = (self.refilled_at(start) - Rational::ONE).max(Rational::ZERO);
        self.last_refill = start;
    }

    /// Wait for and consume one token for a caller arriving at `now`.
    ///
    /// Returns the wait. Callers arriving before an earlier grant queue
    /// behind it in arrival order.
    pub fn reserve(&mut self, now: Rational) -> Rational {
        let wait = self.time_until_token(now);
        self.take(now + wait);
        wait
    }

    fn refilled_at(&self, at: Rational) -> Rational {
        (self.available_tokens + (at - self.last_refill) * self.rate).min(Rational::ONE)
    }
}

/// Per-instance request throttle
///
/// `acquire` is a no-op without a configured rate. The bucket lock is held
/// while a caller waits and the token is only taken once the wait is over,
/// so a caller dropped mid-wait leaves the bucket untouched. The lock is
/// fair, which grants tokens in the order callers reached `acquire`.
#[derive(Debug)]
pub struct RateLimiter {
    rate: Option<Rational>,
    bucket: Option<Mutex<TokenBucket>>,
    origin: Instant,
}

impl RateLimiter {
    pub fn new(rate: Option<Rational>) -> Self {
        Self {
            rate,
            bucket: rate.map(|rate| Mutex::new(TokenBucket::new(rate))),
            origin: Instant::now(),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(None)
    }

    pub fn rate(&self) -> Option<Rational> {
        self.rate
    }

    fn now(&self) -> Rational {
        Rational::from_duration(self.origin.elapsed())
    }

    /// Wait until one request token is available, then consume it
    pub async fn acquire(&self) {
        let Some(bucket) = &self.bucket else {
            return;
        };

        let mut bucket = bucket.lock().await;
        let now = self.now();
        let wait = bucket.time_until_token(now);

        if wait.is_positive() {
            let delay = wait.to_duration();
            debug!("Rate limited, waiting {:.3}s for a token", delay.as_secs_f64());
            tokio::time::sleep(delay).await;
        }

        bucket.take((now + wait).max(self.now()));
    }
}
