// File: feedback-core/src/rate_limiter.rs
//
// Sliding-window request counter per client id, with a temporary block once
// a client goes over the limit. Advisory only: state lives in memory and is
// gone after a restart.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::utils::time::{Clock, SystemClock};

#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    pub max_requests: usize,
    pub window: Duration,
    pub block_duration: Duration,
    /// Upper bound on tracked client ids; the least recently seen is evicted.
    pub max_clients: usize,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window: Duration::seconds(60),
            block_duration: Duration::minutes(5),
            max_clients: 10_000,
        }
    }
}

/// Request timestamps of one client, oldest first. Never holds entries
/// older than the configured window once pruned.
#[derive(Debug, Clone, Default)]
struct RateWindow {
    requests: VecDeque<DateTime<Utc>>,
    last_seen: Option<DateTime<Utc>>,
}

impl RateWindow {
    fn prune(&mut self, cutoff: DateTime<Utc>) {
        while let Some(oldest) = self.requests.front() {
            if *oldest <= cutoff {
                self.requests.pop_front();
            } else {
                break;
            }
        }
    }
}

#[derive(Default)]
struct LimiterState {
    windows: HashMap<String, RateWindow>,
    blocked: HashMap<String, DateTime<Utc>>,
}

pub struct RateLimiter {
    config: RateLimiterConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: RateLimiterConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            state: Mutex::new(LimiterState::default()),
        }
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Records one request for `id` and reports whether it may proceed.
    pub fn check_limit(&self, id: &str) -> bool {
        let now = self.clock.now();
        let mut state = self.state.lock();

        if let Some(until) = state.blocked.get(id).copied() {
            if now < until {
                return false;
            }
            state.blocked.remove(id);
            debug!("Rate limit block expired for client={}", id);
        }

        if !state.windows.contains_key(id) && state.windows.len() >= self.config.max_clients {
            Self::evict_least_recent(&mut state);
        }

        let cutoff = now - self.config.window;
        let window = state.windows.entry(id.to_string()).or_default();
        window.prune(cutoff);
        window.last_seen = Some(now);

        if window.requests.len() >= self.config.max_requests {
            let until = now + self.config.block_duration;
            state.blocked.insert(id.to_string(), until);
            warn!(
                "Client {} exceeded {} requests per {}s; blocked until {}",
                id,
                self.config.max_requests,
                self.config.window.num_seconds(),
                until
            );
            return false;
        }

        window.requests.push_back(now);
        true
    }

    pub fn is_blocked(&self, id: &str) -> bool {
        let now = self.clock.now();
        let mut state = self.state.lock();
        match state.blocked.get(id).copied() {
            Some(until) if now < until => true,
            Some(_) => {
                state.blocked.remove(id);
                false
            }
            None => false,
        }
    }

    /// Lifts a block early (e.g. after an owner signs in again).
    pub fn unblock(&self, id: &str) {
        let mut state = self.state.lock();
        state.blocked.remove(id);
        state.windows.remove(id);
    }

    /// Drops expired blocks and windows with no requests left inside the
    /// window. Returns how many client ids were forgotten.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let cutoff = now - self.config.window;
        let mut state = self.state.lock();

        state.blocked.retain(|_, until| now < *until);

        let LimiterState { windows, blocked } = &mut *state;
        let before = windows.len();
        windows.retain(|id, window| {
            window.prune(cutoff);
            !window.requests.is_empty() || blocked.contains_key(id)
        });
        before - windows.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.state.lock().windows.len()
    }

    fn evict_least_recent(state: &mut LimiterState) {
        let victim = state
            .windows
            .iter()
            .filter(|(id, _)| !state.blocked.contains_key(*id))
            .min_by_key(|(_, w)| w.last_seen)
            .map(|(id, _)| id.clone());
        if let Some(id) = victim {
            debug!("Evicting rate window of least recently seen client={}", id);
            state.windows.remove(&id);
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimiterConfig::default())
    }
}
