use std::time::Duration;

const ONE_SECOND: Duration = Duration::from_secs(1);

/// Whole-second countdown driven by elapsed time reported from the event loop.
///
/// Expiry is reported exactly once, by the `tick` that brings the counter to
/// zero. Any later ticks are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct Countdown {
    remaining_secs: u32,
    carry: Duration,
    expired: bool,
}

impl Countdown {
    pub fn start(duration_secs: u32) -> Self {
        Self {
            remaining_secs: duration_secs,
            carry: Duration::ZERO,
            expired: false,
        }
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn has_expired(&self) -> bool {
        self.expired
    }

    /// Feed elapsed time; returns true on the tick that expires the countdown.
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        if self.expired {
            return false;
        }

        if self.remaining_secs == 0 {
            self.expired = true;
            return true;
        }

        self.carry += elapsed;
        while self.carry >= ONE_SECOND && self.remaining_secs > 0 {
            self.carry -= ONE_SECOND;
            self.remaining_secs -= 1;
        }

        if self.remaining_secs == 0 {
            self.expired = true;
            self.carry = Duration::ZERO;
            return true;
        }
        false
    }
}

/// Holds the one live countdown, tagged with the key it was started for.
///
/// Starting a new countdown drops the previous one first, so a stale key can
/// never be reported as expired.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerSlot<K> {
    active: Option<(K, Countdown)>,
}

impl<K> Default for TimerSlot<K> {
    fn default() -> Self {
        Self { active: None }
    }
}

impl<K: Copy + PartialEq> TimerSlot<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, key: K, duration_secs: u32) {
        self.cancel();
        self.active = Some((key, Countdown::start(duration_secs)));
    }

    pub fn cancel(&mut self) {
        self.active = None;
    }

    pub fn is_running(&self) -> bool {
        matches!(&self.active, Some((_, c)) if !c.has_expired())
    }

    pub fn key(&self) -> Option<K> {
        self.active.as_ref().map(|(k, _)| *k)
    }

    pub fn remaining_secs(&self) -> Option<u32> {
        self.active.as_ref().map(|(_, c)| c.remaining_secs())
    }

    /// Advances the live countdown; yields its key if it expired on this tick.
    pub fn tick(&mut self, elapsed: Duration) -> Option<K> {
        let (key, countdown) = self.active.as_mut()?;
        if countdown.tick(elapsed) {
            Some(*key)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_fires_once_after_duration() {
        let mut c = Countdown::start(5);
        let mut fired = 0;
        let mut seen = vec![];
        for _ in 0..10 {
            if c.tick(ONE_SECOND) {
                fired += 1;
            }
            seen.push(c.remaining_secs());
        }
        assert_eq!(fired, 1);
        assert_eq!(seen[..5], [4, 3, 2, 1, 0]);
        assert!(c.has_expired());
    }

    #[test]
    fn test_countdown_accumulates_sub_second_ticks() {
        let mut c = Countdown::start(1);
        for _ in 0..9 {
            assert!(!c.tick(Duration::from_millis(100)));
        }
        assert_eq!(c.remaining_secs(), 1);
        assert!(c.tick(Duration::from_millis(100)));
        assert_eq!(c.remaining_secs(), 0);
    }

    #[test]
    fn test_countdown_large_tick_expires_once() {
        let mut c = Countdown::start(3);
        assert!(c.tick(Duration::from_secs(10)));
        assert!(!c.tick(Duration::from_secs(10)));
    }

    #[test]
    fn test_zero_duration_expires_on_first_tick() {
        let mut c = Countdown::start(0);
        assert!(c.tick(Duration::ZERO));
        assert!(!c.tick(ONE_SECOND));
    }

    #[test]
    fn test_slot_replace_drops_previous_countdown() {
        let mut slot = TimerSlot::new();
        slot.replace(0usize, 2);
        assert_eq!(slot.tick(ONE_SECOND), None);

        slot.replace(1, 2);
        assert_eq!(slot.remaining_secs(), Some(2));
        assert_eq!(slot.tick(ONE_SECOND), None);
        assert_eq!(slot.tick(ONE_SECOND), Some(1));
        assert_eq!(slot.tick(ONE_SECOND), None);
    }

    #[test]
    fn test_slot_cancel_prevents_expiry() {
        let mut slot = TimerSlot::new();
        slot.replace(3usize, 1);
        slot.cancel();
        assert!(!slot.is_running());
        assert_eq!(slot.tick(Duration::from_secs(5)), None);
        assert_eq!(slot.key(), None);
    }

    #[test]
    fn test_slot_running_state() {
        let mut slot = TimerSlot::new();
        assert!(!slot.is_running());
        slot.replace(0usize, 1);
        assert!(slot.is_running());
        slot.tick(ONE_SECOND);
        assert!(!slot.is_running());
    }
}
