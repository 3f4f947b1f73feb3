//! Shared limiter for outbound provider calls.
//!
//! A GCRA limiter with burst 1 and an emission interval of `window / R`: calls are
//! spaced at least one interval apart, so no rolling window can hold more than R.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::future::Future;
use std::num::NonZeroU32;
use std::time::Duration;

/// Window the provider's limit is expressed in.
pub const PROVIDER_WINDOW: Duration = Duration::from_secs(60);

pub struct ProviderRateLimiter {
    limiter: DefaultDirectRateLimiter,
    per_window: u32,
    window: Duration,
}

impl std::fmt::Debug for ProviderRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRateLimiter")
            .field("per_window", &self.per_window)
            .field("window", &self.window)
            .finish()
    }
}

impl ProviderRateLimiter {
    /// `per_minute` calls per rolling minute (values below 1 are treated as 1).
    pub fn per_minute(per_minute: u32) -> Self {
        Self::new(per_minute, PROVIDER_WINDOW)
    }

    pub fn new(per_window: u32, window: Duration) -> Self {
        let per_window = per_window.max(1);
        let period = (window / per_window).max(Duration::from_nanos(1));
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::direct(quota),
            per_window,
            window,
        }
    }

    pub fn per_window(&self) -> u32 {
        self.per_window
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Waits until a call may be made.
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    /// Runs `call` once a slot is available.
    pub async fn run<F, T>(&self, call: F) -> T
    where
        F: Future<Output = T>,
    {
        self.acquire().await;
        call.await
    }
}
