//! Clocks and cancellable one-shot timers.
//!
//! Timers never run on their own. The owner polls them against a [`Clock`]
//! from its scheduling loop, so tests drive time with [`ManualClock`].

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic time source, measured from an arbitrary epoch
pub trait Clock: fmt::Debug {
    fn now(&self) -> Duration;
}

/// Wall-clock time since construction
#[derive(Debug, Clone)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// Virtual time that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_secs(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs));
    }

    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// A single one-shot timer slot. Arming replaces whatever was armed before.
#[derive(Debug, Clone)]
pub struct TimerSlot<A> {
    armed: Option<(Duration, A)>,
}

impl<A> Default for TimerSlot<A> {
    fn default() -> Self {
        Self { armed: None }
    }
}

impl<A> TimerSlot<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the slot to fire `action` at `deadline`, returning any replaced action
    pub fn arm(&mut self, deadline: Duration, action: A) -> Option<A> {
        self.armed
            .replace((deadline, action))
            .map(|(_, replaced)| replaced)
    }

    /// Disarm the slot, returning the pending action if there was one
    pub fn cancel(&mut self) -> Option<A> {
        self.armed.take().map(|(_, action)| action)
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.armed.as_ref().map(|(deadline, _)| *deadline)
    }

    /// Take the action if its deadline has been reached
    pub fn take_due(&mut self, now: Duration) -> Option<A> {
        if self.deadline().is_some_and(|deadline| deadline <= now) {
            self.cancel()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared() {
        let clock = ManualClock::new();
        let other = clock.clone();
        clock.advance_secs(1.5);
        assert_eq!(other.now(), Duration::from_millis(1500));
    }

    #[test]
    fn test_slot_fires_at_deadline() {
        let mut slot = TimerSlot::new();
        slot.arm(Duration::from_secs(3), "idle");

        assert_eq!(slot.take_due(Duration::from_millis(2999)), None);
        assert_eq!(slot.take_due(Duration::from_secs(3)), Some("idle"));
        assert!(!slot.is_armed());
        assert_eq!(slot.take_due(Duration::from_secs(10)), None);
    }

    #[test]
    fn test_arm_replaces() {
        let mut slot = TimerSlot::new();
        assert_eq!(slot.arm(Duration::from_secs(1), 1), None);
        assert_eq!(slot.arm(Duration::from_secs(5), 2), Some(1));

        assert_eq!(slot.deadline(), Some(Duration::from_secs(5)));
        assert_eq!(slot.take_due(Duration::from_secs(1)), None);
        assert_eq!(slot.take_due(Duration::from_secs(5)), Some(2));
    }

    #[test]
    fn test_cancel() {
        let mut slot = TimerSlot::new();
        slot.arm(Duration::from_secs(1), ());
        assert_eq!(slot.cancel(), Some(()));
        assert_eq!(slot.take_due(Duration::from_secs(2)), None);
    }
}
