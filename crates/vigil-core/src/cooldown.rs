use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::registry::TargetKey;

/// Per-territory rate limit for "assault possible" broadcasts.
///
/// Shared by every supervisor so that stopping and restarting a target does
/// not reset its window.
pub struct Cooldowns {
    window: Duration,
    last_sent: Mutex<HashMap<TargetKey, Instant>>,
}

impl Cooldowns {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_sent: Mutex::new(HashMap::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Claim the right to broadcast for `key` at `now`. Returns `false` while
    /// the previous broadcast is still inside the window.
    pub fn try_acquire(&self, key: &TargetKey, now: Instant) -> bool {
        let mut guard = self.last_sent.lock();
        if let Some(last) = guard.get(key) {
            if now.saturating_duration_since(*last) < self.window {
                return false;
            }
        }
        guard.insert(key.clone(), now);
        true
    }
}
