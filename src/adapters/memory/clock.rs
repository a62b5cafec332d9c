//! Manually driven clock.

use chrono::Duration;
use std::sync::RwLock;

use crate::domain::foundation::Timestamp;
use crate::ports::Clock;

/// Clock that only moves when told to.
///
/// # Panics
///
/// Methods panic if the internal lock is poisoned.
pub struct ManualClock {
    now: RwLock<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    pub fn set(&self, now: Timestamp) {
        *self.now.write().expect("ManualClock: lock poisoned") = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().expect("ManualClock: lock poisoned");
        *now = now.plus(by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.read().expect("ManualClock: lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_now_forward() {
        let start = Timestamp::now();
        let clock = ManualClock::new(start);
        clock.advance(Duration::minutes(61));
        assert_eq!(clock.now(), start.plus_minutes(61));
    }
}
