// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Sliding-window rate limiter for the contact endpoints.
//!
//! Every request for a key is recorded, including ones that end up rejected,
//! and the request is rejected when the number of recorded instants inside the
//! trailing window exceeds the policy maximum. Storage sits behind
//! [`WindowStore`] so a shared store can replace the in-memory map.

use crate::config::RateLimitConfig;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Admission policy for one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Requests admitted within one window
    pub max_requests: u32,
    /// Trailing window length
    pub window: Duration,
}

impl From<&RateLimitConfig> for RateLimitPolicy {
    fn from(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: config.window_duration(),
        }
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed {
        /// Remaining requests in current window
        remaining: u32,
        /// Time until the oldest recorded request leaves the window
        reset_in: Duration,
    },
    /// Request is rate limited
    Limited {
        /// Time until a retry would be admitted
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }
}

/// State of one key's window right after a request was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSnapshot {
    /// Recorded instants inside the window, the current one included
    pub count: usize,
    /// Oldest instant still inside the window
    pub oldest: Instant,
    /// When over the limit, the instant whose expiry readmits the key.
    /// `None` when the key is under the limit or the limit is zero.
    pub release: Option<Instant>,
}

/// Backing store for per-key request instants.
///
/// `record` must prune and append atomically with respect to other calls for
/// the same key.
pub trait WindowStore: Send + Sync {
    /// Drop instants at least `policy.window` older than `now`, then record `now`.
    fn record(&self, key: &str, now: Instant, policy: RateLimitPolicy) -> WindowSnapshot;

    /// Forget keys whose newest instant is at least `idle` older than `now`.
    /// Returns the number of keys removed.
    fn sweep(&self, now: Instant, idle: Duration) -> usize;

    /// Number of keys currently tracked.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local store. Each key's log is guarded by its `DashMap` shard lock.
#[derive(Debug, Default)]
pub struct MemoryWindowStore {
    windows: DashMap<String, VecDeque<Instant>>,
}

impl MemoryWindowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WindowStore for MemoryWindowStore {
    fn record(&self, key: &str, now: Instant, policy: RateLimitPolicy) -> WindowSnapshot {
        let mut entry = self.windows.entry(key.to_string()).or_default();
        let timestamps = entry.value_mut();

        while let Some(&oldest) = timestamps.front() {
            if now.saturating_duration_since(oldest) >= policy.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }
        timestamps.push_back(now);

        // A retry is admitted once at most `max - 1` instants remain, so
        // everything up to index `count - max` has to age out first.
        let count = timestamps.len();
        let max = policy.max_requests as usize;
        let release = if max > 0 && count > max {
            timestamps.get(count - max).copied()
        } else {
            None
        };

        WindowSnapshot {
            count,
            oldest: timestamps.front().copied().unwrap_or(now),
            release,
        }
    }

    fn sweep(&self, now: Instant, idle: Duration) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, timestamps| {
            timestamps
                .back()
                .is_some_and(|newest| now.saturating_duration_since(*newest) < idle)
        });
        before.saturating_sub(self.windows.len())
    }

    fn len(&self) -> usize {
        self.windows.len()
    }
}

/// Thread-safe rate limiter.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn WindowStore>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    /// Create a rate limiter backed by process memory.
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryWindowStore::new()))
    }

    pub fn with_store(store: Arc<dyn WindowStore>) -> Self {
        Self { store }
    }

    /// Check and record a request for `key` now.
    pub fn check(&self, key: &str, policy: RateLimitPolicy) -> RateLimitResult {
        self.check_at(key, policy, Instant::now())
    }

    /// Check and record a request for `key` at `now`.
    pub fn check_at(&self, key: &str, policy: RateLimitPolicy, now: Instant) -> RateLimitResult {
        let snapshot = self.store.record(key, now, policy);
        let until_reset = (snapshot.oldest + policy.window).saturating_duration_since(now);
        let max = policy.max_requests as usize;

        if snapshot.count > max {
            let retry_after = match snapshot.release {
                Some(release) => (release + policy.window).saturating_duration_since(now),
                None => policy.window,
            };
            debug!(key, count = snapshot.count, ?retry_after, "Rate limit exceeded");
            RateLimitResult::Limited { retry_after }
        } else {
            RateLimitResult::Allowed {
                remaining: (max - snapshot.count) as u32,
                reset_in: until_reset,
            }
        }
    }

    /// Clean up keys idle for at least `idle` (should be called periodically).
    pub fn cleanup(&self, idle: Duration) -> usize {
        self.cleanup_at(Instant::now(), idle)
    }

    pub fn cleanup_at(&self, now: Instant, idle: Duration) -> usize {
        let removed = self.store.sweep(now, idle);
        if removed > 0 {
            debug!(removed, remaining = self.store.len(), "Swept idle rate limit keys");
        }
        removed
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.store.len()
    }
}
