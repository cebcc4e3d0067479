//! Rate limiting for inbound WebSocket messages.
//!
//! Each connection carries a [`MessageLimiter`]: a short burst window and a
//! longer sustained window, both sliding.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Sliding window rate limiter
#[derive(Debug)]
pub struct RateLimiter {
    timestamps: VecDeque<Instant>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter
    ///
    /// # Example
    ///
    /// ```
    /// use mx_server::api::rate_limiter::RateLimiter;
    /// use std::time::Duration;
    ///
    /// let mut limiter = RateLimiter::new(2, Duration::from_secs(1));
    /// assert!(limiter.check());
    /// assert!(limiter.check());
    /// assert!(!limiter.check());
    /// ```
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(max_requests),
            max_requests,
            window,
        }
    }

    /// 10 messages per second
    pub fn burst() -> Self {
        Self::new(10, Duration::from_secs(1))
    }

    /// 100 messages per minute
    pub fn sustained() -> Self {
        Self::new(100, Duration::from_secs(60))
    }

    /// Record a request if the window has room
    ///
    /// Returns `false` without recording when the limit is reached.
    pub fn check(&mut self) -> bool {
        self.check_at(Instant::now())
    }

    fn check_at(&mut self, now: Instant) -> bool {
        while let Some(ts) = self.timestamps.front() {
            if now.duration_since(*ts) > self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }

        if self.timestamps.len() >= self.max_requests {
            return false;
        }

        self.timestamps.push_back(now);
        true
    }

    pub fn remaining(&self) -> usize {
        self.max_requests.saturating_sub(self.timestamps.len())
    }
}

/// Which window refused a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitExceeded {
    Burst,
    Sustained,
}

impl LimitExceeded {
    /// Metric label
    pub fn window(self) -> &'static str {
        match self {
            LimitExceeded::Burst => "burst",
            LimitExceeded::Sustained => "sustained",
        }
    }

    /// Text sent back to the client
    pub fn message(self) -> &'static str {
        match self {
            LimitExceeded::Burst => "Rate limit exceeded. Please slow down.",
            LimitExceeded::Sustained => "Too many messages. Please wait before sending more.",
        }
    }
}

/// Burst and sustained limits for one connection
#[derive(Debug)]
pub struct MessageLimiter {
    burst: RateLimiter,
    sustained: RateLimiter,
}

impl MessageLimiter {
    pub fn new(burst: RateLimiter, sustained: RateLimiter) -> Self {
        Self { burst, sustained }
    }

    /// Admit a message, or name the window that refused it
    ///
    /// A message refused by the burst window does not count against the
    /// sustained one.
    pub fn admit(&mut self) -> Result<(), LimitExceeded> {
        if !self.burst.check() {
            return Err(LimitExceeded::Burst);
        }
        if !self.sustained.check() {
            return Err(LimitExceeded::Sustained);
        }
        Ok(())
    }
}

impl Default for MessageLimiter {
    fn default() -> Self {
        Self::new(RateLimiter::burst(), RateLimiter::sustained())
    }
}
