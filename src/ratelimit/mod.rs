//! Fixed-window rate limiting.
//!
//! # Responsibilities
//! - Count requests per caller key within fixed windows
//! - Report limit/remaining/reset for response headers
//! - Garbage-collect expired windows on a background sweep
//!
//! # Design Decisions
//! - Counters live in a `DashMap`; the entry guard makes the
//!   increment-and-compare atomic per key without a global lock
//! - An entry whose window expired is logically absent and re-initialized,
//!   never incremented
//! - "Limit exceeded" is a normal `allowed: false` decision, not an error
//! - Internal limiter faults (degenerate config) fail open: bypassing the
//!   limiter degrades service, refusing all traffic breaks it

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;

use crate::config::schema::RateLimitConfig;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

/// Outcome of a single rate-limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u64,
    pub remaining: u64,
    /// Window reset time, milliseconds since the Unix epoch.
    pub reset_at_ms: u64,
    /// Seconds until the window resets; set only on rejection.
    pub retry_after_secs: Option<u64>,
}

impl RateDecision {
    /// Window reset time in whole epoch seconds, for the reset header.
    pub fn reset_at_secs(&self) -> u64 {
        self.reset_at_ms / 1000
    }
}

#[derive(Debug)]
struct WindowEntry {
    count: u64,
    reset_at_ms: u64,
}

/// Milliseconds since the Unix epoch.
pub fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Fixed-window counter store shared by all routes.
///
/// Key construction is the caller's concern; the limiter only counts.
pub struct FixedWindowLimiter {
    entries: DashMap<String, WindowEntry>,
}

impl FixedWindowLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Check and count one request for `key` under `config`.
    pub fn check(&self, key: &str, config: &RateLimitConfig) -> RateDecision {
        self.check_at(key, config, now_epoch_ms())
    }

    /// Check with an explicit clock, so window behavior is testable
    /// without sleeping.
    pub fn check_at(&self, key: &str, config: &RateLimitConfig, now_ms: u64) -> RateDecision {
        if !config.enabled {
            return RateDecision {
                allowed: true,
                limit: config.max_requests,
                remaining: config.max_requests,
                reset_at_ms: now_ms,
                retry_after_secs: None,
            };
        }

        // Degenerate config cannot count meaningfully; fail open and flag
        // it so operators can tell this apart from blocked attackers.
        if config.window_ms == 0 || config.max_requests == 0 {
            tracing::warn!(key = %key, "Degenerate rate limit config, failing open");
            metrics::record_limiter_fault();
            return RateDecision {
                allowed: true,
                limit: config.max_requests,
                remaining: config.max_requests,
                reset_at_ms: now_ms,
                retry_after_secs: None,
            };
        }

        // The entry guard holds the shard lock for this key, making the
        // read-compare-increment atomic against concurrent requests.
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| WindowEntry {
                count: 0,
                reset_at_ms: now_ms + config.window_ms,
            });

        // An expired window is logically absent: start a new one.
        if entry.reset_at_ms <= now_ms {
            entry.count = 0;
            entry.reset_at_ms = now_ms + config.window_ms;
        }

        if entry.count < config.max_requests {
            entry.count += 1;
            RateDecision {
                allowed: true,
                limit: config.max_requests,
                remaining: config.max_requests - entry.count,
                reset_at_ms: entry.reset_at_ms,
                retry_after_secs: None,
            }
        } else {
            // Rejected requests do not increment; every rejection in the
            // window reports the same reset.
            let millis_left = entry.reset_at_ms.saturating_sub(now_ms);
            RateDecision {
                allowed: false,
                limit: config.max_requests,
                remaining: 0,
                reset_at_ms: entry.reset_at_ms,
                retry_after_secs: Some(millis_left.div_ceil(1000).max(1)),
            }
        }
    }

    /// Remove entries whose window has passed. Returns how many were
    /// collected.
    pub fn sweep(&self) -> usize {
        self.sweep_at(now_epoch_ms())
    }

    fn sweep_at(&self, now_ms: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.reset_at_ms > now_ms);
        before - self.entries.len()
    }

    /// Number of live counter entries.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

impl Default for FixedWindowLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn the periodic garbage-collection sweep.
///
/// The task runs until the shutdown signal fires; without it, one entry
/// per distinct caller IP would accumulate for the life of the process.
pub fn spawn_sweeper(
    limiter: Arc<FixedWindowLimiter>,
    interval: Duration,
    shutdown: &Shutdown,
) -> tokio::task::JoinHandle<()> {
    let mut shutdown_rx = shutdown.subscribe();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = limiter.sweep();
                    if removed > 0 {
                        tracing::debug!(removed, remaining = limiter.entry_count(), "Rate limit sweep");
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::debug!("Rate limit sweeper stopping");
                    break;
                }
            }
        }
    })
}
