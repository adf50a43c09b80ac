use std::time::{Duration, Instant};

use tracing::warn;

/// Owned handle to at most one pending one-shot deadline.
///
/// Arming always replaces whatever was pending, so a caller can never end
/// up with two overlapping callbacks for the same logical timer.
#[derive(Debug, Default, Clone)]
pub struct TimerSlot {
    deadline: Option<Instant>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel any pending deadline and schedule a new one `delay` after `now`.
    ///
    /// A deadline past the end of the monotonic clock leaves the slot empty.
    pub fn arm(&mut self, now: Instant, delay: Duration) -> Option<Instant> {
        self.cancel();
        let Some(at) = now.checked_add(delay) else {
            warn!(?delay, "timer delay overflows the clock; leaving timer unarmed");
            return None;
        };
        self.deadline = Some(at);
        Some(at)
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|at| now >= at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rearm_replaces_pending_deadline() {
        let t0 = Instant::now();
        let mut slot = TimerSlot::new();
        slot.arm(t0, Duration::from_millis(1000));
        let second = slot.arm(t0, Duration::from_millis(16));
        assert_eq!(slot.deadline(), second);
        assert!(slot.is_due(t0 + Duration::from_millis(16)));
        assert!(!slot.is_due(t0 + Duration::from_millis(15)));
    }

    #[test]
    fn cancelled_slot_is_never_due() {
        let t0 = Instant::now();
        let mut slot = TimerSlot::new();
        slot.arm(t0, Duration::ZERO);
        slot.cancel();
        assert!(!slot.is_armed());
        assert!(!slot.is_due(t0 + Duration::from_secs(60)));
    }

    #[test]
    fn overflowing_delay_leaves_slot_empty() {
        let t0 = Instant::now();
        let mut slot = TimerSlot::new();
        slot.arm(t0, Duration::from_secs(1));
        assert_eq!(slot.arm(t0, Duration::MAX), None);
        assert!(!slot.is_armed());
    }
}
