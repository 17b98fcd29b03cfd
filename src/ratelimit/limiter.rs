use std::net::IpAddr;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::RateLimitConfig;

struct Window {
    started_at: Instant,
    count: u32,
}

/// Fixed-window request counter, one window per client IP.
pub struct RateLimiter {
    windows: DashMap<IpAddr, Window>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_limits(config.max_requests, config.window)
    }

    pub fn with_limits(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests,
            window,
        }
    }

    /// Counts one request for `ip`. Returns `false` when the budget for the
    /// current window is spent.
    pub fn check(&self, ip: IpAddr) -> bool {
        let mut entry = self.windows.entry(ip).or_insert_with(|| Window {
            started_at: Instant::now(),
            count: 0,
        });

        if entry.started_at.elapsed() >= self.window {
            entry.started_at = Instant::now();
            entry.count = 0;
        }

        if entry.count < self.max_requests {
            entry.count += 1;
            true
        } else {
            tracing::warn!("Rate limit exceeded for {}", ip);
            false
        }
    }
}
