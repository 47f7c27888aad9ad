//! Sliding-window rate limiter.
//!
//! Bounds the number of requests a single provider adapter may issue within
//! a trailing time window. Each adapter owns one limiter instance; the
//! timestamp queue is shared safely between concurrent in-flight requests.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::errors::ProviderError;

pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    admitted: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Result<Self, ProviderError> {
        if max_requests == 0 {
            return Err(ProviderError::Config(
                "rate limiter max_requests must be > 0".to_string(),
            ));
        }
        if window.is_zero() {
            return Err(ProviderError::Config(
                "rate limiter window must be > 0".to_string(),
            ));
        }
        Ok(Self {
            max_requests,
            window,
            admitted: Mutex::new(VecDeque::with_capacity(max_requests)),
        })
    }

    /// Limiter with a one-minute trailing window.
    pub fn per_minute(max_requests: usize) -> Result<Self, ProviderError> {
        Self::new(max_requests, Duration::from_secs(60))
    }

    /// Suspend the caller until one more request fits inside the window.
    ///
    /// The lock is released before sleeping, so concurrent callers queue on
    /// the mutex only for the admission decision itself.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut admitted = self.admitted.lock().await;
                let now = Instant::now();

                while let Some(&oldest) = admitted.front() {
                    if now.duration_since(oldest) >= self.window {
                        admitted.pop_front();
                    } else {
                        break;
                    }
                }

                if admitted.len() < self.max_requests {
                    admitted.push_back(now);
                    return;
                }

                match admitted.front() {
                    Some(&oldest) => self.window - now.duration_since(oldest),
                    None => Duration::ZERO,
                }
            };

            if wait.is_zero() {
                continue;
            }

            debug!(wait_ms = wait.as_millis() as u64, "Rate limit reached, waiting");
            tokio::time::sleep(wait).await;
        }
    }
}
