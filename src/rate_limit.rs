//! Fixed-window admission control
//!
//! One counter per (caller address, tool, window start). The window start is
//! the request time floored to the containing interval, so counters reset at
//! each boundary instead of sliding. Old windows are purged opportunistically
//! whenever a new one is created; there is no background sweeper.

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};
use tracing::debug;

/// Windows created longer ago than this are dropped during purge.
const RETENTION: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct WindowKey {
    address: IpAddr,
    tool: String,
    window_start: i64,
}

struct Window {
    count: u32,
    created_at: Instant,
}

/// Fixed-window request counter shared by all request handlers.
pub struct RateLimiter {
    windows: DashMap<WindowKey, Window>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            windows: DashMap::new(),
        }
    }

    /// Admit or deny one request. Counts the request when admitted; a denied
    /// request does not consume quota.
    pub fn check(
        &self,
        address: IpAddr,
        tool: &str,
        max_requests: u32,
        window_seconds: u64,
    ) -> bool {
        self.check_at(address, tool, max_requests, window_seconds, Utc::now().timestamp())
    }

    /// Quota left in the current window, never negative. Does not mutate.
    pub fn remaining(
        &self,
        address: IpAddr,
        tool: &str,
        max_requests: u32,
        window_seconds: u64,
    ) -> u32 {
        self.remaining_at(address, tool, max_requests, window_seconds, Utc::now().timestamp())
    }

    fn check_at(
        &self,
        address: IpAddr,
        tool: &str,
        max_requests: u32,
        window_seconds: u64,
        now: i64,
    ) -> bool {
        let key = WindowKey {
            address,
            tool: tool.to_string(),
            window_start: window_start(now, window_seconds),
        };

        // The entry guard pins the map shard for this key, so find-or-create
        // and the count update happen as one step even under contention.
        let mut created = false;
        let admitted = match self.windows.entry(key) {
            Entry::Occupied(mut occupied) => {
                let window = occupied.get_mut();
                if window.count < max_requests {
                    window.count += 1;
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Window {
                    count: 1,
                    created_at: Instant::now(),
                });
                created = true;
                true
            }
        };

        if created {
            self.purge_expired(RETENTION);
        }
        admitted
    }

    fn remaining_at(
        &self,
        address: IpAddr,
        tool: &str,
        max_requests: u32,
        window_seconds: u64,
        now: i64,
    ) -> u32 {
        let key = WindowKey {
            address,
            tool: tool.to_string(),
            window_start: window_start(now, window_seconds),
        };
        self.windows
            .get(&key)
            .map(|window| max_requests.saturating_sub(window.count))
            .unwrap_or(max_requests)
    }

    fn purge_expired(&self, retention: Duration) {
        let before = self.windows.len();
        self.windows
            .retain(|_, window| window.created_at.elapsed() < retention);
        let dropped = before.saturating_sub(self.windows.len());
        if dropped > 0 {
            debug!("Purged {dropped} expired rate windows");
        }
    }
}

fn window_start(now: i64, window_seconds: u64) -> i64 {
    let width = window_seconds.max(1) as i64;
    now - now.rem_euclid(width)
}
