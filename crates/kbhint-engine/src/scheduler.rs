//! Apply scheduler
//!
//! Coalesces re-apply signals: while a pass is pending further signals are
//! dropped, and two passes are never closer than `min_interval` apart.

use crate::Millis;

/// What a re-apply request did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleDecision {
    /// A pass was already pending
    Coalesced,
    /// A pass should run after `delay`
    Scheduled { delay: Millis },
}

#[derive(Debug, Clone)]
pub struct ApplyScheduler {
    min_interval: Millis,
    scheduled: bool,
    last_apply_at: Option<Millis>,
}

impl ApplyScheduler {
    pub fn new(min_interval: Millis) -> Self {
        Self {
            min_interval,
            scheduled: false,
            last_apply_at: None,
        }
    }

    /// Scheduler that behaves as if a pass ran at `last`
    #[cfg(test)]
    pub fn with_last_apply(min_interval: Millis, last: Millis) -> Self {
        Self {
            last_apply_at: Some(last),
            ..Self::new(min_interval)
        }
    }

    pub fn request(&mut self, now: Millis) -> ScheduleDecision {
        if self.scheduled {
            return ScheduleDecision::Coalesced;
        }
        self.scheduled = true;
        let delay = match self.last_apply_at {
            Some(last) => self.min_interval.saturating_sub(now.saturating_sub(last)),
            None => 0,
        };
        ScheduleDecision::Scheduled { delay }
    }

    /// The pending pass is starting now
    pub fn complete(&mut self, now: Millis) {
        self.scheduled = false;
        self.last_apply_at = Some(now);
    }

    /// A pass ran outside the scheduler (the initial one)
    pub fn record_direct_pass(&mut self, now: Millis) {
        self.last_apply_at = Some(now);
    }

    pub fn reset(&mut self) {
        self.scheduled = false;
        self.last_apply_at = None;
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    pub fn last_apply_at(&self) -> Option<Millis> {
        self.last_apply_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_request_runs_immediately() {
        let mut scheduler = ApplyScheduler::new(300);
        assert_eq!(scheduler.request(1000), ScheduleDecision::Scheduled { delay: 0 });
    }

    #[test]
    fn test_signals_coalesce_until_complete() {
        let mut scheduler = ApplyScheduler::with_last_apply(300, 0);
        assert_eq!(scheduler.request(0), ScheduleDecision::Scheduled { delay: 300 });
        assert_eq!(scheduler.request(50), ScheduleDecision::Coalesced);
        assert_eq!(scheduler.request(100), ScheduleDecision::Coalesced);

        scheduler.complete(300);
        assert!(!scheduler.is_scheduled());
        assert_eq!(scheduler.request(450), ScheduleDecision::Scheduled { delay: 150 });
    }

    #[test]
    fn test_long_gap_means_no_delay() {
        let mut scheduler = ApplyScheduler::with_last_apply(300, 0);
        assert_eq!(scheduler.request(5000), ScheduleDecision::Scheduled { delay: 0 });
    }

    #[test]
    fn test_reset() {
        let mut scheduler = ApplyScheduler::with_last_apply(300, 10);
        scheduler.request(20);
        scheduler.reset();
        assert_eq!(scheduler.last_apply_at(), None);
        assert_eq!(scheduler.request(20), ScheduleDecision::Scheduled { delay: 0 });
    }
}
