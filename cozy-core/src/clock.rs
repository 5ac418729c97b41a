//! Wall-clock sources for mission timing.

use std::cell::Cell;
use std::rc::Rc;

use crate::constants::MS_PER_MINUTE;

/// Source of the current time in milliseconds since the Unix epoch.
///
/// The client clock is trusted; remaining time is recomputed from absolute
/// timestamps on every read, so a suspended tab catches up instead of
/// drifting.
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// Host system clock. Not available on `wasm32`, where `SystemTime` panics;
/// the web crate supplies a browser clock instead.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
    }
}

/// Hand-driven clock for tests and simulations. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<i64>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn set_ms(&self, now_ms: i64) {
        self.now.set(now_ms);
    }

    pub fn advance_ms(&self, delta_ms: i64) {
        self.now.set(self.now.get().saturating_add(delta_ms));
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn advance_minutes(&self, minutes: f64) {
        self.advance_ms((minutes * MS_PER_MINUTE).round() as i64);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.get()
    }
}
