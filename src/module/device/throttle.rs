//! Narration rate limiting.
//!
//! Requests inside the cooldown window are dropped, not queued. A request that passes
//! preempts whatever is still being spoken.

use std::time::Instant;

use super::speaker::Narrator;

/// Source of the current time in milliseconds.
pub trait Clock: Send {
    fn now_ms(&self) -> i64;
}

/// Monotonic clock counting from its creation. Unaffected by wall-clock steps.
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> i64 {
        i64::try_from(self.origin.elapsed().as_millis()).unwrap_or(i64::MAX)
    }
}

/// Bookkeeping of the last emission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrottleState {
    pub last_emission_ms: Option<i64>,
    pub cooldown_ms: u64,
}

impl ThrottleState {
    pub fn new(cooldown_ms: u64) -> Self {
        Self {
            last_emission_ms: None,
            cooldown_ms,
        }
    }

    /// Whether an emission at `now` respects the cooldown.
    pub fn allows(&self, now: i64) -> bool {
        match self.last_emission_ms {
            Some(last) => now.saturating_sub(last) >= self.cooldown_ms as i64,
            None => true,
        }
    }
}

/// Owns the narrator and the only [`ThrottleState`].
pub struct NarrationThrottle {
    state: ThrottleState,
    narrator: Box<dyn Narrator>,
    clock: Box<dyn Clock>,
}

impl NarrationThrottle {
    pub fn new(cooldown_ms: u64, narrator: Box<dyn Narrator>, clock: Box<dyn Clock>) -> Self {
        Self {
            state: ThrottleState::new(cooldown_ms),
            narrator,
            clock,
        }
    }

    pub fn state(&self) -> ThrottleState {
        self.state
    }

    /// Try to speak `text`. Returns whether it was emitted.
    ///
    /// Backend failures are logged and still count as an emission.
    pub fn try_narrate(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let now = self.clock.now_ms();
        if !self.state.allows(now) {
            log::debug!("Narration dropped (cooldown): {}", text);
            return false;
        }
        self.narrator.cancel_current();
        if let Err(e) = self.narrator.speak(text) {
            log::warn!("Narration failed. {}", e);
        } else {
            log::info!("Narrate: {}", text);
        }
        self.state.last_emission_ms = Some(now);
        true
    }
}
