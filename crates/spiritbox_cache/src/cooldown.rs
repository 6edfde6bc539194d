//! Per-member cooldown tracking.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Gate that allows one counted event per `(user, guild)` per window.
///
/// This is the first stage of the message pipeline: a message landing
/// inside the window is dropped before any I/O happens.
#[derive(Debug)]
pub struct CooldownTracker {
    window: Duration,
    last_seen: HashMap<(i64, i64), Instant>,
}

impl CooldownTracker {
    /// Create a tracker with the given window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_seen: HashMap::new(),
        }
    }

    /// Whether the member is past their window. Passing the gate stamps
    /// a new window; a denied call leaves the stamp untouched.
    pub fn check_and_touch(&mut self, user_id: i64, guild_id: i64) -> bool {
        let now = Instant::now();
        let key = (user_id, guild_id);
        match self.last_seen.get(&key) {
            Some(last) if now.duration_since(*last) < self.window => {
                debug!(user_id, guild_id, "Message inside cooldown window");
                false
            }
            _ => {
                self.last_seen.insert(key, now);
                true
            }
        }
    }

    /// Time left in the member's window, if any.
    pub fn remaining(&self, user_id: i64, guild_id: i64) -> Option<Duration> {
        self.last_seen.get(&(user_id, guild_id)).and_then(|last| {
            let elapsed = last.elapsed();
            (elapsed < self.window).then(|| self.window - elapsed)
        })
    }

    /// Drop stamps older than the window. Returns the number removed.
    pub fn sweep(&mut self) -> usize {
        let window = self.window;
        let before = self.last_seen.len();
        self.last_seen.retain(|_, last| last.elapsed() < window);
        before - self.last_seen.len()
    }

    /// Number of tracked members.
    pub fn len(&self) -> usize {
        self.last_seen.len()
    }

    /// Whether no members are tracked.
    pub fn is_empty(&self) -> bool {
        self.last_seen.is_empty()
    }
}
