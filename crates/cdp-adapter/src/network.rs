//! In-flight request bookkeeping used by the network-settled wait.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;

/// Point-in-time view of page network activity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    /// Requests started and not yet finished or failed.
    pub inflight: u64,
    /// Total requests observed since the session started.
    pub requests: u64,
    pub since_last_activity: Duration,
}

impl NetworkSnapshot {
    /// True when nothing is in flight and the page has been silent for `window`.
    pub fn is_quiet(&self, window: Duration) -> bool {
        self.inflight == 0 && self.since_last_activity >= window
    }

    /// Like [`is_quiet`](Self::is_quiet), but silence only counts from `waited`
    /// ago: idle time from before the wait began does not satisfy the window.
    pub fn is_quiet_within(&self, window: Duration, waited: Duration) -> bool {
        self.inflight == 0 && self.since_last_activity.min(waited) >= window
    }
}

struct TrackerState {
    inflight: HashSet<String>,
    requests: u64,
    last_activity: Instant,
}

/// Counts requests by id; redirects reuse the id and so stay a single entry.
pub struct NetworkTracker {
    state: Mutex<TrackerState>,
}

impl Default for NetworkTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkTracker {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TrackerState {
                inflight: HashSet::new(),
                requests: 0,
                last_activity: Instant::now(),
            }),
        }
    }

    pub fn request_started(&self, request_id: &str) {
        let mut state = self.state.lock();
        if state.inflight.insert(request_id.to_string()) {
            state.requests += 1;
        }
        state.last_activity = Instant::now();
    }

    pub fn request_finished(&self, request_id: &str) {
        let mut state = self.state.lock();
        state.inflight.remove(request_id);
        state.last_activity = Instant::now();
    }

    pub fn snapshot(&self) -> NetworkSnapshot {
        let state = self.state.lock();
        NetworkSnapshot {
            inflight: state.inflight.len() as u64,
            requests: state.requests,
            since_last_activity: Instant::now().saturating_duration_since(state.last_activity),
        }
    }
}
