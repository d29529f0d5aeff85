//! Runtime abstractions shared by the engine services.
//!
//! Sleeping and deadlines are injected so retry and rate-limit behaviour can
//! be exercised in tests without waiting on wall-clock time.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;

use super::config::RateLimitConfig;
use super::{Error, CoreResult};

/// Async sleeping abstraction.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend execution for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Run `future` under `deadline`, mapping expiry to the timeout error kind.
pub async fn with_deadline<T, F>(deadline: Duration, operation: &str, future: F) -> CoreResult<T>
where
    F: Future<Output = CoreResult<T>>,
{
    match tokio::time::timeout(deadline, future).await {
        Ok(result) => result,
        Err(_) => Err(Error::timeout(format!("{operation} deadline expired"))),
    }
}

/// Process-wide sliding-window rate limiter for the generative upstreams.
///
/// Admission records call instants in a window; callers over the limit sleep
/// until the oldest recorded call ages out.
pub struct SlidingWindowLimiter {
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    window: tokio::sync::Mutex<VecDeque<DateTime<Utc>>>,
}

impl SlidingWindowLimiter {
    pub fn new(
        mut config: RateLimitConfig,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        config.max_calls = config.max_calls.max(1);
        Self {
            config,
            clock,
            sleeper,
            window: tokio::sync::Mutex::new(VecDeque::new()),
        }
    }

    /// Admit one call, sleeping while the window is saturated.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut window = self.window.lock().await;
                let now = self.clock.utc();
                self.prune(&mut window, now);

                if window.len() < self.config.max_calls {
                    window.push_back(now);
                    return;
                }

                // Sleep until the oldest call leaves the window.
                let oldest = *window.front().expect("saturated window is non-empty");
                let reopens = oldest
                    + chrono::TimeDelta::from_std(self.config.window)
                        .unwrap_or(chrono::TimeDelta::seconds(60));
                (reopens - now)
                    .to_std()
                    .unwrap_or(Duration::from_millis(10))
            };
            self.sleeper.sleep(wait.max(Duration::from_millis(10))).await;
        }
    }

    /// Calls currently recorded inside the window.
    pub async fn in_flight(&self) -> usize {
        let mut window = self.window.lock().await;
        let now = self.clock.utc();
        self.prune(&mut window, now);
        window.len()
    }

    fn prune(&self, window: &mut VecDeque<DateTime<Utc>>, now: DateTime<Utc>) {
        let horizon = now
            - chrono::TimeDelta::from_std(self.config.window)
                .unwrap_or(chrono::TimeDelta::seconds(60));
        while window.front().is_some_and(|instant| *instant <= horizon) {
            window.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ImmediateSleeper, MutableClock};
    use chrono::TimeZone;

    fn fixed_clock() -> Arc<MutableClock> {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("valid instant");
        Arc::new(MutableClock::new(start))
    }

    #[tokio::test]
    async fn limiter_admits_up_to_the_window_limit() {
        let clock = fixed_clock();
        let limiter = SlidingWindowLimiter::new(
            RateLimitConfig {
                max_calls: 3,
                window: Duration::from_secs(60),
            },
            clock.clone(),
            Arc::new(ImmediateSleeper),
        );

        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(limiter.in_flight().await, 3);
    }

    #[tokio::test]
    async fn limiter_releases_slots_once_calls_age_out() {
        let clock = fixed_clock();
        let limiter = SlidingWindowLimiter::new(
            RateLimitConfig {
                max_calls: 2,
                window: Duration::from_secs(60),
            },
            clock.clone(),
            Arc::new(ImmediateSleeper),
        );

        limiter.acquire().await;
        limiter.acquire().await;
        clock.advance_seconds(61);
        assert_eq!(limiter.in_flight().await, 0);

        limiter.acquire().await;
        assert_eq!(limiter.in_flight().await, 1);
    }

    #[tokio::test]
    async fn deadline_expiry_maps_to_timeout() {
        let result: CoreResult<()> = with_deadline(Duration::from_millis(5), "embed", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        let error = result.expect_err("deadline should expire");
        assert_eq!(error.code(), crate::domain::ErrorCode::Timeout);
    }

    #[tokio::test]
    async fn deadline_passes_through_inner_results() {
        let result = with_deadline(Duration::from_secs(1), "embed", async { Ok(7_u32) }).await;
        assert_eq!(result.expect("inner result"), 7);
    }
}
